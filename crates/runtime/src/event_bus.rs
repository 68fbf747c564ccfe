use std::collections::VecDeque;

use crate::tick::Tick;

/// A notification together with the tick at which it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<E> {
    pub tick: Tick,
    pub event: E,
}

/// Single-consumer FIFO of notifications.
///
/// Emitting never delivers anything; the owner drains the queue once the
/// call that produced the notifications has returned. This keeps delivery
/// out of the emitting call stack.
#[derive(Debug)]
pub struct EventBus<E> {
    next_tick: Tick,
    events: VecDeque<Stamped<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_tick: Tick::ZERO,
            events: VecDeque::new(),
        }
    }

    pub fn emit(&mut self, event: E) -> Tick {
        let tick = self.next_tick;
        self.next_tick = tick.next();
        self.events.push_back(Stamped { tick, event });
        tick
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stamped<E>> {
        self.events.iter()
    }

    pub fn pop(&mut self) -> Option<Stamped<E>> {
        self.events.pop_front()
    }

    pub fn drain(&mut self) -> Vec<Stamped<E>> {
        self.events.drain(..).collect()
    }
}
