//! Latency-gated FIFO.
//!
//! A [`TimedQueue`] is a delay line layered on a FIFO: every entry remembers when it was
//! inserted, and the front entry is "ready" once a fixed latency has elapsed since then.
//! The queue has no capacity of its own; callers enforce their limits before pushing.

use std::collections::VecDeque;

use crate::common::Tick;

/// FIFO whose entries become ready a fixed latency after insertion.
#[derive(Debug)]
pub struct TimedQueue<T> {
    latency: Tick,
    entries: VecDeque<(T, Tick)>,
}

impl<T> TimedQueue<T> {
    /// Creates an empty queue with the given latency in ticks.
    pub const fn new(latency: Tick) -> Self {
        Self {
            latency,
            entries: VecDeque::new(),
        }
    }

    /// Returns the latency every entry must wait before it is ready.
    #[inline]
    pub const fn latency(&self) -> Tick {
        self.latency
    }

    /// Appends `item`, recording `insertion_time`.
    ///
    /// Insertion times are expected to be non-decreasing, as they are when callers pass
    /// the current simulation time.
    pub fn push(&mut self, item: T, insertion_time: Tick) {
        self.entries.push_back((item, insertion_time));
    }

    /// Removes and returns the front entry.
    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop_front().map(|(item, _)| item)
    }

    /// Returns the front entry.
    pub fn front(&self) -> Option<&T> {
        self.entries.front().map(|(item, _)| item)
    }

    /// Returns the front entry mutably.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.entries.front_mut().map(|(item, _)| item)
    }

    /// Returns the front entry mutably together with its insertion time.
    pub fn front_entry_mut(&mut self) -> Option<(&mut T, Tick)> {
        self.entries.front_mut().map(|(item, time)| (item, *time))
    }

    /// Returns the insertion time of the front entry.
    pub fn front_time(&self) -> Option<Tick> {
        self.entries.front().map(|&(_, time)| time)
    }

    /// Returns `true` if the queue holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the front entry has waited at least the latency at `current_time`.
    pub fn has_ready(&self, current_time: Tick) -> bool {
        self.first_ready_time()
            .is_some_and(|ready| current_time >= ready)
    }

    /// Returns the earliest time the front entry is ready.
    pub fn first_ready_time(&self) -> Option<Tick> {
        self.front_time().map(|time| time + self.latency)
    }

    /// Iterates entries front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(item, _)| item)
    }
}
