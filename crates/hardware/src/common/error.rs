//! Protocol fault and error definitions.
//!
//! This module defines the error handling for the simulator. There are exactly two classes
//! of anomaly inside the relay:
//! 1. **Protocol Faults:** A scheduled action or a peer invoked the relay outside a legal
//!    precondition. These are fatal; the simulation run ends with the fault as its result.
//! 2. **Displacements:** Responses returning out of order. These are counted in the relay's
//!    statistics and are not errors at all.
//!
//! Configuration and run-level errors wrap the above for the driver and the CLI.

use std::fmt;
use std::io;

use thiserror::Error;

/// Identifies one of the relay's three timed buffers in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Buffer holding admitted requests awaiting inspection.
    Inspection,
    /// Buffer holding tagged requests awaiting the far-side link.
    Output,
    /// Buffer holding responses awaiting validation and the near-side link.
    Response,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inspection => "inspection",
            Self::Output => "output",
            Self::Response => "response",
        };
        f.write_str(name)
    }
}

/// Identifies one of the relay's two link endpoints in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Near-side endpoint: receives requests, sends responses.
    CpuSide,
    /// Far-side endpoint: sends requests, receives responses.
    MemSide,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CpuSide => f.write_str("cpu_side_port"),
            Self::MemSide => f.write_str("mem_side_port"),
        }
    }
}

/// A violated flow-control precondition.
///
/// Every fault is detected before the offending action touches any buffer, so the relay's
/// state at the time of the fault is exactly the state that exposed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolFault {
    /// A send was attempted on a port still holding a rejected packet.
    #[error("{port}: should never try to send if blocked")]
    SendWhileBlocked {
        /// The blocked port.
        port: PortKind,
    },

    /// A scheduled action fired with no ready entry at the front of its buffer.
    #[error("{buffer} buffer: should never act if no packet is ready")]
    NothingReady {
        /// The buffer with no ready entry.
        buffer: BufferKind,
    },

    /// Inspection fired while the output buffer had no free entry.
    #[error("output buffer: should never inspect without a free output entry")]
    NoOutputCapacity,

    /// A retry signal was about to be issued to a peer that was never refused.
    #[error("{port}: should never send retry if not needed")]
    RetryNotNeeded {
        /// The port whose peer was never refused.
        port: PortKind,
    },

    /// A peer signalled retry to a port that is not holding a rejected packet.
    #[error("{port}: should never receive retry if not blocked")]
    RetryWhileUnblocked {
        /// The port that received the retry.
        port: PortKind,
    },

    /// A response reached validation without a sequence tag.
    #[error("packet {id}: there is no tag attached to the response")]
    MissingTag {
        /// Identifier of the untagged packet.
        id: u64,
    },

    /// A request reached inspection already carrying a sequence tag.
    #[error("packet {id}: tag slot already occupied")]
    TagOccupied {
        /// Identifier of the doubly-tagged packet.
        id: u64,
    },

    /// A packet travelled the wrong path (a response on the request path or vice versa).
    #[error("packet {id}: should only inspect {expected}s")]
    WrongDirection {
        /// Identifier of the misrouted packet.
        id: u64,
        /// The direction that path accepts.
        expected: &'static str,
    },
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    /// The configuration text was not valid JSON for the expected schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A buffer was configured with no entries.
    #[error("{buffer} buffer must have at least one entry")]
    ZeroCapacity {
        /// The buffer configured with zero entries.
        buffer: BufferKind,
    },

    /// The clock period was configured as zero ticks.
    #[error("clock period must be at least one tick")]
    ZeroClockPeriod,

    /// Any other out-of-range value.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
}

/// Errors that end a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// The relay or one of its peers violated the flow-control protocol.
    #[error("protocol fault: {0}")]
    Protocol(#[from] ProtocolFault),

    /// The simulator could not be constructed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
