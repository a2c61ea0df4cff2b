//! Discrete-event queue.
//!
//! A binary-heap event queue keyed by `(time, insertion order)`. It provides:
//! 1. **Single pending instance:** an event value is either pending once or not at all.
//! 2. **Deterministic order:** events at the same tick are delivered in the order they
//!    were scheduled.
//! 3. **Rescheduling:** a pending event can be moved; the superseded heap entry is
//!    discarded lazily when it surfaces.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

use tracing::trace;

use super::event::{RelayEvent, Scheduler};
use crate::common::Tick;

#[derive(Debug)]
struct Entry<E> {
    when: Tick,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.when == other.when && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.when, self.seq).cmp(&(other.when, other.seq))
    }
}

/// Time-ordered queue of pending events.
///
/// `E` is the event identifier; scheduling an identifier that is already pending is a
/// no-op, which is exactly the guard the relay's schedule helpers rely on.
#[derive(Debug)]
pub struct EventQueue<E> {
    cur_tick: Tick,
    next_seq: u64,
    heap: BinaryHeap<Reverse<Entry<E>>>,
    pending: HashMap<E, (Tick, u64)>,
    delivered: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            cur_tick: 0,
            next_seq: 0,
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            delivered: 0,
        }
    }
}

impl<E: Copy + Eq + Hash> EventQueue<E> {
    /// Creates an empty queue at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the time of the most recently delivered event.
    #[inline]
    pub const fn now(&self) -> Tick {
        self.cur_tick
    }

    /// Returns the number of events delivered so far.
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns `true` if `event` is pending.
    pub fn is_pending(&self, event: E) -> bool {
        self.pending.contains_key(&event)
    }

    /// Returns the delivery time of `event` if it is pending.
    pub fn when(&self, event: E) -> Option<Tick> {
        self.pending.get(&event).map(|&(when, _)| when)
    }

    /// Returns the time of the earliest pending event.
    pub fn next_time(&self) -> Option<Tick> {
        self.pending.values().map(|&(when, _)| when).min()
    }

    /// Schedules `event` at `when` unless it is already pending.
    ///
    /// Times before the current tick are delivered at the current tick.
    ///
    /// # Returns
    ///
    /// `true` if the event was added, `false` if it was already pending.
    pub fn schedule_at(&mut self, event: E, when: Tick) -> bool {
        if self.pending.contains_key(&event) {
            return false;
        }
        self.insert(event, when);
        true
    }

    /// Schedules `event` at `when`, moving it if it is already pending.
    pub fn reschedule(&mut self, event: E, when: Tick) {
        self.insert(event, when);
    }

    /// Ensures `event` is delivered no later than `when`.
    ///
    /// A pending instance at or before `when` is left alone; a later one is moved.
    pub fn schedule_no_later(&mut self, event: E, when: Tick) {
        match self.when(event) {
            Some(pending) if pending <= when => {}
            _ => self.insert(event, when),
        }
    }

    /// Cancels `event`.
    ///
    /// # Returns
    ///
    /// `true` if the event was pending.
    pub fn deschedule(&mut self, event: E) -> bool {
        self.pending.remove(&event).is_some()
    }

    /// Moves the current time forward to `when` without delivering anything.
    ///
    /// # Returns
    ///
    /// `false`, leaving time unchanged, if `when` is in the past or a pending event is
    /// due before it.
    pub fn advance_to(&mut self, when: Tick) -> bool {
        if when < self.cur_tick || self.next_time().is_some_and(|next| next < when) {
            return false;
        }
        self.cur_tick = when;
        true
    }

    /// Removes the earliest pending event and advances time to it.
    ///
    /// # Returns
    ///
    /// The delivery time and the event, or `None` if nothing is pending.
    pub fn pop(&mut self) -> Option<(Tick, E)> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            let live = self.pending.get(&entry.event) == Some(&(entry.when, entry.seq));
            if !live {
                continue;
            }
            let _ = self.pending.remove(&entry.event);
            self.cur_tick = entry.when;
            self.delivered += 1;
            return Some((entry.when, entry.event));
        }
        None
    }

    fn insert(&mut self, event: E, when: Tick) {
        let when = when.max(self.cur_tick);
        let seq = self.next_seq;
        self.next_seq += 1;
        let _ = self.pending.insert(event, (when, seq));
        self.heap.push(Reverse(Entry { when, seq, event }));
    }
}

impl<E> Scheduler for EventQueue<E>
where
    E: From<RelayEvent> + Copy + Eq + Hash,
{
    fn now(&self) -> Tick {
        self.cur_tick
    }

    fn schedule(&mut self, event: RelayEvent, when: Tick) {
        if !self.schedule_at(E::from(event), when) {
            trace!(%event, when, "already pending; schedule request ignored");
        }
    }

    fn is_scheduled(&self, event: RelayEvent) -> bool {
        self.is_pending(E::from(event))
    }
}
