//! System-on-Chip (SoC) Components.
//!
//! This module organizes the components that make up the simulated system: the relay
//! itself, the packets and link endpoints it is built from, and the peer devices that
//! sit on either side of it.

/// Peer devices (traffic generator and timing memory).
pub mod devices;

/// Packets, directions, and sequence tags.
pub mod packet;

/// Near-side and far-side link endpoints with block/retry state.
pub mod port;

/// The buffered request/response relay.
pub mod relay;

/// Sequence tagging and reorder detection.
pub mod tagger;

/// Latency-gated FIFO used for every relay buffer.
pub mod timed_queue;

/// Peer capability traits (`Requestor`, `Responder`) and retry grants.
pub mod traits;

pub use packet::{AccessKind, Direction, Packet, SequenceTag};
pub use relay::{InspectorGadget, RelayContext};
pub use traits::{Requestor, Responder, RetryGrant};
