//! Clock domain arithmetic.
//!
//! A clocked component only acts on edges of its own clock. This module converts between
//! cycles and ticks and snaps arbitrary times forward to clock edges. Edges sit at integer
//! multiples of the period, starting at tick 0.

use crate::common::{Cycles, Tick};

/// A fixed-period clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockDomain {
    period: Tick,
}

impl ClockDomain {
    /// Creates a clock with the given period.
    ///
    /// # Arguments
    ///
    /// * `period` - Ticks per cycle; must be non-zero (guaranteed by `RelayConfig::validate`).
    pub const fn new(period: Tick) -> Self {
        Self { period }
    }

    /// Returns the clock period in ticks.
    #[inline]
    pub const fn period(&self) -> Tick {
        self.period
    }

    /// Converts a cycle count to a duration in ticks.
    ///
    /// Saturates at `Tick::MAX`; validated configurations stay far below it.
    #[inline]
    pub const fn ticks(&self, cycles: Cycles) -> Tick {
        cycles.0.saturating_mul(self.period)
    }

    /// Converts a cycle count to ticks, or `None` if the product overflows.
    #[inline]
    pub const fn checked_ticks(&self, cycles: Cycles) -> Option<Tick> {
        cycles.0.checked_mul(self.period)
    }

    /// Snaps `when` forward to the nearest clock edge at or after it.
    ///
    /// # Returns
    ///
    /// `when` itself if it already lies on an edge, otherwise the next edge.
    #[inline]
    pub const fn align(&self, when: Tick) -> Tick {
        when.div_ceil(self.period) * self.period
    }

    /// Returns the edge `cycles` cycles after the current-or-next edge of `now`.
    ///
    /// `clock_edge(now, Cycles(0))` is `align(now)`.
    #[inline]
    pub const fn clock_edge(&self, now: Tick, cycles: Cycles) -> Tick {
        self.align(now) + cycles.0 * self.period
    }

    /// Returns the first edge strictly after the current-or-next edge of `now`.
    #[inline]
    pub const fn next_cycle(&self, now: Tick) -> Tick {
        self.clock_edge(now, Cycles(1))
    }

    /// Returns `true` if `when` lies exactly on a clock edge.
    #[inline]
    pub const fn is_edge(&self, when: Tick) -> bool {
        when % self.period == 0
    }
}
