/// Deterministic position in the single-threaded event sequence.
///
/// Every delivered notification and every state-machine transition is
/// stamped with a tick, so "happens-before" between a write and the
/// notification it causes can be checked after the fact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    pub fn next(self) -> Self {
        Tick(self.0.wrapping_add(1))
    }

    /// Number of ticks elapsed since `earlier` (0 if `earlier` is later).
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}
