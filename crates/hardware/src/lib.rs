//! Clocked request/response relay library.
//!
//! This crate models a buffered relay that sits between a request issuer and a memory,
//! with the following:
//! 1. **Relay:** Inspection, output, and response buffers with latency gating, retry-based
//!    backpressure on both links, and sequence tagging for reorder detection.
//! 2. **Time:** Clock domains and a deterministic discrete-event queue.
//! 3. **SoC:** Packets, link endpoints, and peer devices (traffic generator, timing memory).
//! 4. **Simulation:** Configuration, a complete simulator, and statistics reporting.

/// Common types (ticks, cycles, addresses, ranges, errors).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures, validation).
pub mod config;
/// Clock, events, event queue, and the top-level simulator.
pub mod sim;
/// System-on-chip (packets, ports, relay, tagger, buffers, devices).
pub mod soc;
/// Relay statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or load it from JSON.
pub use crate::config::Config;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// The relay; construct with `InspectorGadget::new`.
pub use crate::soc::InspectorGadget;
/// Relay counters.
pub use crate::stats::RelayStats;
