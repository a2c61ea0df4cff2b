//! # Peer Device Tests
//!
//! The relay's near-side and far-side peers used by the simulator.

pub mod memory;
