//! Common utilities and types used throughout the relay simulator.
//!
//! This module provides fundamental building blocks that are shared across all components
//! of the simulator. It includes:
//! 1. **Time Types:** Simulation ticks and clock-cycle counts.
//! 2. **Address Types:** Raw addresses and half-open address ranges for range discovery.
//! 3. **Error Handling:** Protocol faults, configuration errors, and simulation errors.

/// Address and address-range definitions.
pub mod addr;

/// Error types for protocol faults, configuration, and simulation runs.
pub mod error;

/// Simulation time units (ticks and cycles).
pub mod time;

pub use addr::{Addr, AddrRange};
pub use error::{BufferKind, ConfigError, PortKind, ProtocolFault, SimError};
pub use time::{Cycles, Tick};
