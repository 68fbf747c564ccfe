//! Two-way synchronization between the map view and session history.
//!
//! Transition table, in one place ([`HistorySync::dispatch`]):
//!
//! | state        | notification               | effect                          | next         |
//! |--------------|----------------------------|---------------------------------|--------------|
//! | `Idle`       | `ViewSettled`/`BasemapChanged` | encode view, push entry     | `Idle`       |
//! | `Suppressed` | `ViewSettled`/`BasemapChanged` | nothing                     | `Idle`       |
//! | any          | `HistoryNavigated(None)`   | nothing                         | unchanged    |
//! | any          | `HistoryNavigated(Some)`   | write view to host              | `Suppressed` |
//!
//! Entering `Suppressed` happens before the host write, and the host only
//! delivers the resulting settle notification after the write returned
//! (see [`MapHost`]). That ordering is what keeps a restore from pushing a
//! duplicate entry.

use runtime::Tick;
use tracing::{debug, info, warn};

use crate::codec::{self, ViewState};
use crate::error::PermalinkError;
use crate::history::{HistoryEntry, HistoryState, SessionHistory};
use crate::host::{MapHost, ViewWrite};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Pan or zoom finished.
    ViewSettled,
    /// The visible basemap changed.
    BasemapChanged,
    /// Back/forward. Carries the entry's state object, `None` for entries
    /// that were not pushed by us.
    HistoryNavigated(Option<HistoryState>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// A restore wrote to the host at `since`; the next settle notification
    /// is its echo and is swallowed.
    Suppressed { since: Tick },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Pushed(HistoryEntry),
    Swallowed,
    Restored(HistoryState),
    Ignored,
}

/// Where the startup view came from.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupSource {
    Fragment,
    NoFragment,
    /// The fragment was present but unusable; defaults were applied.
    Rejected(PermalinkError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Startup {
    pub state: ViewState,
    pub source: StartupSource,
}

impl Startup {
    /// Decides the initial view from the page-load fragment. Never fails:
    /// anything unusable falls back to `defaults`.
    pub fn resolve(
        fragment: Option<&str>,
        host: &impl MapHost,
        defaults: ViewState,
    ) -> Self {
        let Some(fragment) = fragment.filter(|f| !f.trim_start_matches('#').is_empty()) else {
            return Self {
                state: defaults,
                source: StartupSource::NoFragment,
            };
        };

        let decoded = codec::decode(fragment).map_err(PermalinkError::from).and_then(|s| {
            s.validate(host.zoom_range(), host.basemaps().len())?;
            Ok(s)
        });
        match decoded {
            Ok(state) => Self {
                state,
                source: StartupSource::Fragment,
            },
            Err(e) => {
                warn!(fragment, error = %e, "ignoring view fragment, using defaults");
                Self {
                    state: defaults,
                    source: StartupSource::Rejected(e),
                }
            }
        }
    }
}

/// View ⇄ history state machine. Owns the map host and the session history
/// it keeps in step.
#[derive(Debug)]
pub struct HistorySync<H, S> {
    host: H,
    history: S,
    state: SyncState,
    clock: Tick,
}

impl<H: MapHost, S: SessionHistory> HistorySync<H, S> {
    /// Seeds the host from the current fragment (or `defaults`) before the
    /// first render. Pushes nothing.
    ///
    /// Fails only if `defaults` themselves cannot be applied to the host.
    pub fn start(mut host: H, history: S, defaults: ViewState) -> Result<(Self, Startup), PermalinkError> {
        let fragment = history.current_fragment();
        let mut startup = Startup::resolve(fragment.as_deref(), &host, defaults);

        if let Err(e) = host.seed(startup.state.view(), startup.state.basemap) {
            if startup.state == defaults {
                return Err(e);
            }
            warn!(error = %e, "seeding from fragment failed, using defaults");
            host.seed(defaults.view(), defaults.basemap)?;
            startup = Startup {
                state: defaults,
                source: StartupSource::Rejected(e),
            };
        }

        info!(
            source = ?startup.source,
            fragment = %codec::encode(&startup.state),
            "initial view"
        );

        let sync = Self {
            host,
            history,
            state: SyncState::Idle,
            clock: Tick::ZERO,
        };
        Ok((sync, startup))
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Tick of the last dispatched notification.
    pub fn clock(&self) -> Tick {
        self.clock
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access for user gestures. Gestures only queue notifications;
    /// deliver them with [`HistorySync::pump`].
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn history(&self) -> &S {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut S {
        &mut self.history
    }

    pub fn into_parts(self) -> (H, S) {
        (self.host, self.history)
    }

    /// Current view as it would be written to the URL.
    pub fn current_view_state(&self) -> Result<ViewState, PermalinkError> {
        let view = self.host.view();
        let basemap = self.host.basemaps().current_visible_index()?;
        Ok(ViewState::new(view.zoom, view.center, basemap))
    }

    pub fn dispatch(&mut self, notification: Notification) -> Result<Transition, PermalinkError> {
        self.clock = self.clock.next();
        match (self.state, notification) {
            (
                SyncState::Suppressed { since },
                Notification::ViewSettled | Notification::BasemapChanged,
            ) => {
                self.state = SyncState::Idle;
                debug!(
                    tick = %self.clock,
                    after = self.clock.since(since),
                    "swallowed settle caused by history restore"
                );
                Ok(Transition::Swallowed)
            }
            (SyncState::Idle, Notification::ViewSettled | Notification::BasemapChanged) => {
                self.push_current()
            }
            (_, Notification::HistoryNavigated(None)) => {
                debug!(tick = %self.clock, "history entry without view state, ignored");
                Ok(Transition::Ignored)
            }
            (_, Notification::HistoryNavigated(Some(restored))) => self.restore(restored),
        }
    }

    /// Delivers every notification the host queued, in order, each after the
    /// previous handler returned. Failures are logged and do not stop the
    /// remaining deliveries.
    pub fn pump(&mut self) -> Vec<Transition> {
        let queued = self.host.take_notifications();
        let mut out = Vec::with_capacity(queued.len());
        for stamped in queued {
            match self.dispatch(stamped.event) {
                Ok(t) => out.push(t),
                Err(e) => warn!(host_tick = %stamped.tick, error = %e, "notification failed"),
            }
        }
        out
    }

    fn push_current(&mut self) -> Result<Transition, PermalinkError> {
        let state = self.current_view_state()?;
        let entry = HistoryEntry {
            hash: codec::encode(&state),
            state: HistoryState::from_view(state.view()),
        };
        self.history.push(&entry)?;
        debug!(tick = %self.clock, hash = %entry.hash, "pushed history entry");
        Ok(Transition::Pushed(entry))
    }

    fn restore(&mut self, restored: HistoryState) -> Result<Transition, PermalinkError> {
        // An earlier restore may still be waiting for its settle notification.
        let prior = self.state;
        self.state = SyncState::Suppressed { since: self.clock };
        match self.host.write_view(restored.view()) {
            Ok(ViewWrite::Pending) => {
                debug!(tick = %self.clock, zoom = restored.zoom, "restored view from history");
            }
            Ok(ViewWrite::Unchanged) => {
                // This write causes no settle; only a pending one is left to swallow.
                self.state = prior;
                debug!(tick = %self.clock, "restored view already shown");
            }
            Err(e) => {
                self.state = prior;
                return Err(e);
            }
        }
        Ok(Transition::Restored(restored))
    }
}
