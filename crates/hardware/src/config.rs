//! Configuration system for the relay simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline buffer capacities, latencies, and clock period.
//! 2. **Structures:** Hierarchical config for the relay, the traffic generator, and the memory.
//! 3. **Loading:** JSON deserialization from a string or a file, followed by validation.
//!
//! Every field has a default, so `{}` is a valid configuration. The relay section is
//! immutable once a relay has been constructed from it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{AddrRange, BufferKind, ConfigError, Cycles, Tick};

/// Default configuration constants for the simulator.
mod defaults {
    /// Relay clock period in ticks (one cycle of a 3 GHz clock at 1 ps per tick).
    pub const CLOCK_PERIOD: u64 = 333;

    /// Inspection buffer capacity in entries.
    pub const INSPECTION_BUFFER_ENTRIES: usize = 8;

    /// Output buffer capacity in entries.
    pub const OUTPUT_BUFFER_ENTRIES: usize = 8;

    /// Response buffer capacity in entries.
    ///
    /// Larger than the request side so responses drain while requests are throttled.
    pub const RESPONSE_BUFFER_ENTRIES: usize = 32;

    /// Cycles a request must spend in the inspection buffer.
    pub const INSPECTION_LATENCY: u64 = 1;

    /// Cycles a response must spend in the response buffer.
    pub const RESPONSE_LATENCY: u64 = 1;

    /// Number of requests the traffic generator issues.
    pub const NUM_REQUESTS: u64 = 64;

    /// Cycles between consecutive request issues.
    pub const ISSUE_INTERVAL: u64 = 1;

    /// Byte distance between consecutive request addresses.
    pub const STRIDE: u64 = 64;

    /// Bytes per request.
    pub const REQUEST_SIZE: u32 = 64;

    /// Cycles the generator waits before signalling retry after refusing a response.
    pub const RETRY_DELAY: u64 = 1;

    /// Base address of the memory range.
    pub const MEM_BASE: u64 = 0x8000_0000;

    /// Size of the memory range (512 MiB).
    pub const MEM_SIZE: u64 = 512 * 1024 * 1024;

    /// Fixed memory access latency in cycles.
    pub const MEM_LATENCY: u64 = 10;

    /// Maximum requests the memory holds before refusing more.
    pub const MEM_MAX_OUTSTANDING: usize = 16;

    /// Longest clock period, latency, or interval a configuration may ask for, in ticks.
    ///
    /// About 75 simulated minutes at 1 ps per tick; leaves room for `now + duration`.
    pub const MAX_DURATION_TICKS: u64 = 1 << 52;
}

/// Rejects a cycle count whose length in ticks overflows or exceeds the duration limit.
fn check_duration(
    field: &'static str,
    cycles: Cycles,
    clock_period: Tick,
) -> Result<(), ConfigError> {
    match cycles.val().checked_mul(clock_period) {
        Some(ticks) if ticks <= defaults::MAX_DURATION_TICKS => Ok(()),
        _ => Err(ConfigError::InvalidValue {
            field,
            reason: format!(
                "{cycles} at {clock_period} ticks per cycle exceeds {} ticks",
                defaults::MAX_DURATION_TICKS
            ),
        }),
    }
}

/// Order in which the timing memory releases completed responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResponseOrder {
    /// Responses leave in the order their requests arrived.
    #[default]
    InOrder,
    /// Each adjacent pair of ready responses is released second-first.
    ///
    /// Used to exercise the relay's displacement accounting.
    PairSwapped,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use gadget_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.relay.inspection_buffer_entries, 8);
/// assert_eq!(config.relay.response_buffer_entries, 32);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use gadget_core::config::{Config, ResponseOrder};
///
/// let json = r#"{
///     "relay": {
///         "clock_period": 1000,
///         "inspection_buffer_entries": 2,
///         "output_buffer_entries": 2,
///         "response_buffer_entries": 2
///     },
///     "memory": { "latency": 4, "response_order": "PairSwapped" }
/// }"#;
///
/// let config = Config::from_json_str(json).unwrap();
/// assert_eq!(config.relay.clock_period, 1000);
/// assert_eq!(config.relay.inspection_latency.val(), 1);
/// assert_eq!(config.memory.response_order, ResponseOrder::PairSwapped);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay clock, buffer capacities, and buffer latencies.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Near-side traffic generator settings.
    #[serde(default)]
    pub traffic: TrafficConfig,
    /// Far-side timing memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Config {
    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Validates every section, then checks the peers' timing against the relay clock.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay.validate()?;
        self.traffic.validate()?;
        self.memory.validate()?;

        let period = self.relay.clock_period;
        check_duration("traffic.interval", self.traffic.interval, period)?;
        check_duration("traffic.retry_delay", self.traffic.retry_delay, period)?;
        check_duration("memory.latency", self.memory.latency, period)
    }
}

/// Relay parameters.
///
/// Capacities are in entries; latencies are in relay clock cycles. The output buffer
/// always holds a request for exactly one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Relay clock period in ticks.
    #[serde(default = "RelayConfig::default_clock_period")]
    pub clock_period: Tick,

    /// Number of entries in the inspection buffer.
    #[serde(default = "RelayConfig::default_inspection_buffer_entries")]
    pub inspection_buffer_entries: usize,

    /// Number of entries in the output buffer.
    #[serde(default = "RelayConfig::default_output_buffer_entries")]
    pub output_buffer_entries: usize,

    /// Number of entries in the response buffer.
    #[serde(default = "RelayConfig::default_response_buffer_entries")]
    pub response_buffer_entries: usize,

    /// Cycles a request waits in the inspection buffer before it can be inspected.
    #[serde(default = "RelayConfig::default_inspection_latency")]
    pub inspection_latency: Cycles,

    /// Cycles a response waits in the response buffer before it can be forwarded.
    #[serde(default = "RelayConfig::default_response_latency")]
    pub response_latency: Cycles,
}

impl RelayConfig {
    fn default_clock_period() -> Tick {
        defaults::CLOCK_PERIOD
    }

    fn default_inspection_buffer_entries() -> usize {
        defaults::INSPECTION_BUFFER_ENTRIES
    }

    fn default_output_buffer_entries() -> usize {
        defaults::OUTPUT_BUFFER_ENTRIES
    }

    fn default_response_buffer_entries() -> usize {
        defaults::RESPONSE_BUFFER_ENTRIES
    }

    const fn default_inspection_latency() -> Cycles {
        Cycles(defaults::INSPECTION_LATENCY)
    }

    const fn default_response_latency() -> Cycles {
        Cycles(defaults::RESPONSE_LATENCY)
    }

    /// Creates a relay configuration with the given capacities and default timing.
    ///
    /// # Arguments
    ///
    /// * `inspection` - Inspection buffer entries.
    /// * `output` - Output buffer entries.
    /// * `response` - Response buffer entries.
    pub fn with_capacities(inspection: usize, output: usize, response: usize) -> Self {
        Self {
            inspection_buffer_entries: inspection,
            output_buffer_entries: output,
            response_buffer_entries: response,
            ..Self::default()
        }
    }

    /// Rejects zero capacities, a zero clock period, and latencies too long to represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_period == 0 {
            return Err(ConfigError::ZeroClockPeriod);
        }
        check_duration("relay.clock_period", Cycles(1), self.clock_period)?;
        check_duration(
            "relay.inspection_latency",
            self.inspection_latency,
            self.clock_period,
        )?;
        check_duration(
            "relay.response_latency",
            self.response_latency,
            self.clock_period,
        )?;
        let capacities = [
            (BufferKind::Inspection, self.inspection_buffer_entries),
            (BufferKind::Output, self.output_buffer_entries),
            (BufferKind::Response, self.response_buffer_entries),
        ];
        if let Some((buffer, _)) = capacities.iter().find(|(_, entries)| *entries == 0) {
            return Err(ConfigError::ZeroCapacity { buffer: *buffer });
        }
        Ok(())
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            clock_period: defaults::CLOCK_PERIOD,
            inspection_buffer_entries: defaults::INSPECTION_BUFFER_ENTRIES,
            output_buffer_entries: defaults::OUTPUT_BUFFER_ENTRIES,
            response_buffer_entries: defaults::RESPONSE_BUFFER_ENTRIES,
            inspection_latency: Self::default_inspection_latency(),
            response_latency: Self::default_response_latency(),
        }
    }
}

/// Near-side traffic generator parameters.
///
/// The generator issues a fixed number of requests with a linear address pattern. Timing
/// is in relay clock cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Total number of requests to issue.
    #[serde(default = "TrafficConfig::default_num_requests")]
    pub num_requests: u64,

    /// Cycles between consecutive issues.
    #[serde(default = "TrafficConfig::default_interval")]
    pub interval: Cycles,

    /// Address of the first request.
    #[serde(default = "TrafficConfig::default_base_addr")]
    pub base_addr: u64,

    /// Byte distance between consecutive request addresses.
    #[serde(default = "TrafficConfig::default_stride")]
    pub stride: u64,

    /// Bytes per request.
    #[serde(default = "TrafficConfig::default_size")]
    pub size: u32,

    /// Every n-th request is a write; 0 issues only reads.
    #[serde(default)]
    pub write_every: u64,

    /// Every n-th response delivery is refused once; 0 accepts all. Must not be 1.
    #[serde(default)]
    pub reject_response_every: u64,

    /// Cycles to wait after refusing a response before signalling retry.
    #[serde(default = "TrafficConfig::default_retry_delay")]
    pub retry_delay: Cycles,
}

impl TrafficConfig {
    fn default_num_requests() -> u64 {
        defaults::NUM_REQUESTS
    }

    const fn default_interval() -> Cycles {
        Cycles(defaults::ISSUE_INTERVAL)
    }

    fn default_base_addr() -> u64 {
        defaults::MEM_BASE
    }

    fn default_stride() -> u64 {
        defaults::STRIDE
    }

    fn default_size() -> u32 {
        defaults::REQUEST_SIZE
    }

    const fn default_retry_delay() -> Cycles {
        Cycles(defaults::RETRY_DELAY)
    }

    /// Rejects settings that would livelock the generator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reject_response_every == 1 {
            return Err(ConfigError::InvalidValue {
                field: "traffic.reject_response_every",
                reason: "refusing every response never makes progress".to_string(),
            });
        }
        if self.interval.val() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "traffic.interval",
                reason: "issue interval must be at least one cycle".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            num_requests: defaults::NUM_REQUESTS,
            interval: Self::default_interval(),
            base_addr: defaults::MEM_BASE,
            stride: defaults::STRIDE,
            size: defaults::REQUEST_SIZE,
            write_every: 0,
            reject_response_every: 0,
            retry_delay: Self::default_retry_delay(),
        }
    }
}

/// Far-side timing memory parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Base address of the served range.
    #[serde(default = "MemoryConfig::default_base")]
    pub base: u64,

    /// Size of the served range in bytes.
    #[serde(default = "MemoryConfig::default_size")]
    pub size: u64,

    /// Fixed access latency in relay clock cycles.
    #[serde(default = "MemoryConfig::default_latency")]
    pub latency: Cycles,

    /// Requests held (pending or blocked) before further requests are refused.
    #[serde(default = "MemoryConfig::default_max_outstanding")]
    pub max_outstanding: usize,

    /// Release order of completed responses.
    #[serde(default)]
    pub response_order: ResponseOrder,
}

impl MemoryConfig {
    fn default_base() -> u64 {
        defaults::MEM_BASE
    }

    fn default_size() -> u64 {
        defaults::MEM_SIZE
    }

    const fn default_latency() -> Cycles {
        Cycles(defaults::MEM_LATENCY)
    }

    fn default_max_outstanding() -> usize {
        defaults::MEM_MAX_OUTSTANDING
    }

    /// Returns the address range this memory serves.
    pub const fn range(&self) -> AddrRange {
        AddrRange::with_size(self.base, self.size)
    }

    /// Rejects a memory that could never accept a request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_outstanding == 0 {
            return Err(ConfigError::InvalidValue {
                field: "memory.max_outstanding",
                reason: "memory must accept at least one request".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base: defaults::MEM_BASE,
            size: defaults::MEM_SIZE,
            latency: Self::default_latency(),
            max_outstanding: defaults::MEM_MAX_OUTSTANDING,
            response_order: ResponseOrder::InOrder,
        }
    }
}
