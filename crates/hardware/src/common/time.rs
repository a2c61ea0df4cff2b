//! Simulation time units.
//!
//! Time in the simulator is measured in ticks, a monotonically increasing integer unit
//! shared by every component. Clocked components express delays in cycles of their own
//! clock and convert them to ticks through a [`ClockDomain`](crate::sim::clock::ClockDomain).

use std::fmt;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// Global simulation time in ticks.
pub type Tick = u64;

/// A count of clock cycles in some component's clock domain.
///
/// Kept distinct from [`Tick`] so a cycle count is never mistaken for an absolute time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycles(pub u64);

impl Cycles {
    /// Creates a new cycle count.
    #[inline]
    pub const fn new(cycles: u64) -> Self {
        Self(cycles)
    }

    /// Returns the raw cycle count.
    #[inline]
    pub const fn val(self) -> u64 {
        self.0
    }
}

impl Add for Cycles {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<Tick> for Cycles {
    type Output = Tick;

    /// Scales a cycle count by a clock period, yielding a duration in ticks.
    fn mul(self, period: Tick) -> Tick {
        self.0 * period
    }
}

impl From<u64> for Cycles {
    fn from(cycles: u64) -> Self {
        Self(cycles)
    }
}

impl fmt::Display for Cycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cycles", self.0)
    }
}
