//! Simulation time and event delivery.
//!
//! This module provides the machinery that drives a relay through time:
//! 1. **Clock:** Clock-edge arithmetic for a fixed-period clock domain.
//! 2. **Events:** The relay's event identifiers and the scheduler interface it schedules through.
//! 3. **Queue:** A deterministic discrete-event queue implementing that interface.
//! 4. **Simulator:** A complete system of traffic generator, relay, and timing memory.

/// Clock domain arithmetic (edges, alignment, cycle conversion).
pub mod clock;

/// Relay event identifiers and the `Scheduler` trait.
pub mod event;

/// Binary-heap discrete-event queue.
pub mod queue;

/// Top-level simulator wiring the relay between its peers.
pub mod simulator;

pub use clock::ClockDomain;
pub use event::{RelayEvent, Scheduler};
pub use queue::EventQueue;
pub use simulator::{RunSummary, SimEvent, Simulator};
