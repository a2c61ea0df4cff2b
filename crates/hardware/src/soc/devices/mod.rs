//! Peer Devices.
//!
//! This module contains the components a relay is wired between in a complete
//! simulation: a request-issuing traffic generator on the near side and a fixed-latency
//! memory on the far side.

/// Far-side fixed-latency memory.
pub mod memory;

/// Near-side request generator.
pub mod traffic;

pub use memory::TimingMemory;
pub use traffic::TrafficGenerator;

pub use crate::soc::traits::{Requestor, Responder};
