//! Address and Address Range types.
//!
//! The relay never decodes addresses itself; it only reports the ranges its far side
//! serves so that whatever sits on the near side can route to it. This module provides:
//! 1. **Raw Addresses:** A plain 64-bit address alias carried by packets.
//! 2. **Ranges:** Half-open `[start, end)` ranges with containment and overlap checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A raw physical address carried by a packet.
pub type Addr = u64;

/// A half-open address range `[start, end)`.
///
/// Ranges are reported by a far-side responder and passed through the relay unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddrRange {
    /// First address covered by the range.
    pub start: Addr,
    /// One past the last address covered by the range.
    pub end: Addr,
}

impl AddrRange {
    /// Creates a new range covering `[start, end)`.
    ///
    /// # Arguments
    ///
    /// * `start` - First address in the range.
    /// * `end` - One past the last address in the range.
    ///
    /// # Returns
    ///
    /// A new `AddrRange`; an `end` at or below `start` yields an empty range.
    #[inline]
    pub const fn new(start: Addr, end: Addr) -> Self {
        Self { start, end }
    }

    /// Creates a range of `size` bytes beginning at `start`.
    #[inline]
    pub const fn with_size(start: Addr, size: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    /// Returns the number of bytes covered by the range.
    #[inline]
    pub const fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range covers no addresses.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `addr` falls inside the range.
    #[inline]
    pub const fn contains(&self, addr: Addr) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Returns `true` if the two ranges share at least one address.
    pub const fn intersects(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for AddrRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}:{:#x})", self.start, self.end)
    }
}
