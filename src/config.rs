//! Configuration types for the buffer simulator.
//!
//! Mirrors the reference crate's `config.rs`: a `defaults` submodule of named
//! constants, `serde`-deserializable structs for loading a run's
//! configuration from JSON, and `#[default]`-tagged enums for the small set
//! of mode switches the simulator exposes.

use serde::Deserialize;

use crate::common::error::SimError;

/// Named default values for every tunable the simulator exposes.
///
/// Centralising these avoids magic numbers scattered across `config.rs` and
/// gives [`BufferConfig::default`] and serde's `#[serde(default = ...)]`
/// attributes a single source of truth.
pub mod defaults {
    /// Total SRAM capacity backing both windows, in bytes.
    pub const TOTAL_SIZE_BYTES: usize = 128 * 1024;
    /// Size of one addressable element, in bytes.
    pub const WORD_SIZE: usize = 4;
    /// Fraction of the buffer's capacity dedicated to the active window.
    pub const ACTIVE_BUF_FRAC: f64 = 0.9;
    /// Cycles to service a hit against the active window.
    pub const HIT_LATENCY: u64 = 1;
    /// Elements moved per cycle between the buffer and DRAM.
    pub const BACKING_BW: usize = 64;
    /// Number of independent banks the backing bandwidth is split across.
    pub const NUM_BANK: usize = 1;
    /// Ports available per bank, per cycle.
    pub const NUM_PORT: usize = 1;
    /// Depth of the backing port's in-flight request queue.
    pub const REQUEST_QUEUE_SIZE: usize = 100;
    /// Constant-mode DRAM round-trip latency, in cycles.
    pub const CONSTANT_READ_LATENCY: u64 = 10;
    /// Constant-mode DRAM round-trip latency for the write port, in cycles.
    pub const CONSTANT_WRITE_LATENCY: u64 = 0;
    /// Latency entries above this value are treated as unreliable trace
    /// samples and replaced with a fallback.
    pub const LATENCY_CLAMP: u64 = 10_000;

    pub(crate) const fn default_constant_read_latency() -> u64 {
        CONSTANT_READ_LATENCY
    }

    pub(crate) const fn default_constant_write_latency() -> u64 {
        CONSTANT_WRITE_LATENCY
    }

    pub(crate) const fn default_queue_size() -> usize {
        REQUEST_QUEUE_SIZE
    }
}

/// How a backing port derives the latency of each outstanding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyMode {
    /// Every request takes the same fixed number of cycles.
    #[default]
    Constant,
    /// Latency is drawn per-request from a pre-recorded trace, falling back
    /// to the constant latency once the trace is exhausted or an entry is
    /// out of range.
    Trace,
}

/// Configuration for one backing port (the read port or the write port).
#[derive(Debug, Clone, Deserialize)]
pub struct PortConfig {
    /// Latency derivation mode.
    #[serde(default)]
    pub latency_mode: LatencyMode,
    /// Constant-mode latency, and the fallback used in trace mode.
    pub constant_latency: u64,
    /// Depth of the in-flight request queue used to derive stalls.
    #[serde(default = "defaults::default_queue_size")]
    pub queue_size: usize,
    /// Per-request latencies consumed in order when `latency_mode` is
    /// [`LatencyMode::Trace`]. Ignored in constant mode.
    #[serde(default)]
    pub trace_latencies: Vec<u64>,
}

impl PortConfig {
    /// A read-port configuration using the crate's read-side defaults.
    pub fn default_read() -> Self {
        Self {
            latency_mode: LatencyMode::default(),
            constant_latency: defaults::default_constant_read_latency(),
            queue_size: defaults::default_queue_size(),
            trace_latencies: Vec::new(),
        }
    }

    /// A write-port configuration using the crate's write-side defaults.
    pub fn default_write() -> Self {
        Self {
            latency_mode: LatencyMode::default(),
            constant_latency: defaults::default_constant_write_latency(),
            queue_size: defaults::default_queue_size(),
            trace_latencies: Vec::new(),
        }
    }
}

/// Full configuration for a [`crate::buffer::ReadBuffer`].
///
/// # Examples
///
/// ```
/// use sram_buffer_sim::config::BufferConfig;
///
/// let json = r#"{
///     "total_size_bytes": 65536,
///     "word_size": 4,
///     "active_buf_frac": 0.85,
///     "backing_bw": 32,
///     "num_bank": 2,
///     "num_port": 1,
///     "enable_layout_evaluation": false,
///     "read_port": { "constant_latency": 10 }
/// }"#;
/// let config: BufferConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.num_bank, 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Total SRAM capacity backing both windows, in bytes.
    pub total_size_bytes: usize,
    /// Size of one addressable element, in bytes.
    pub word_size: usize,
    /// Fraction of the buffer's capacity dedicated to the active window.
    /// Must fall in `[0.5, 1.0)`.
    pub active_buf_frac: f64,
    /// Cycles to service a hit against the active window.
    #[serde(default = "defaults_hit_latency")]
    pub hit_latency: u64,
    /// Elements moved per cycle between the buffer and DRAM. Must divide
    /// evenly by `num_bank`.
    pub backing_bw: usize,
    /// Number of independent banks the backing bandwidth is split across.
    #[serde(default = "defaults_num_bank")]
    pub num_bank: usize,
    /// Ports available per bank, per cycle.
    #[serde(default = "defaults_num_port")]
    pub num_port: usize,
    /// Whether line lookups additionally resolve a bank column, enabling
    /// the layout-aware servicing path.
    #[serde(default)]
    pub enable_layout_evaluation: bool,
    /// Whether a request's completion cycle additionally folds in the
    /// per-call DRAM stall reported by the initial fill. Named after the
    /// reference buffer model's Ramulator trace-replay mode, which this
    /// flag gates independently of [`PortConfig`]'s own latency mode.
    #[serde(default)]
    pub use_ramulator_trace: bool,
    /// Read-port configuration.
    pub read_port: PortConfig,
    /// Write-port configuration. Defaults to a zero-latency constant port.
    #[serde(default = "PortConfig::default_write")]
    pub write_port: PortConfig,
}

fn defaults_hit_latency() -> u64 {
    defaults::HIT_LATENCY
}

fn defaults_num_bank() -> usize {
    defaults::NUM_BANK
}

fn defaults_num_port() -> usize {
    defaults::NUM_PORT
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            total_size_bytes: defaults::TOTAL_SIZE_BYTES,
            word_size: defaults::WORD_SIZE,
            active_buf_frac: defaults::ACTIVE_BUF_FRAC,
            hit_latency: defaults::HIT_LATENCY,
            backing_bw: defaults::BACKING_BW,
            num_bank: defaults::NUM_BANK,
            num_port: defaults::NUM_PORT,
            enable_layout_evaluation: false,
            use_ramulator_trace: false,
            read_port: PortConfig::default_read(),
            write_port: PortConfig::default_write(),
        }
    }
}

impl BufferConfig {
    /// Validates the configuration, returning the element counts derived
    /// from it on success.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidActiveBufFrac`],
    /// [`SimError::BandwidthNotDivisibleByBanks`], or
    /// [`SimError::InvalidPortCount`] when the corresponding field is out of
    /// range.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.5..1.0).contains(&self.active_buf_frac) {
            return Err(SimError::InvalidActiveBufFrac(self.active_buf_frac));
        }
        if self.num_bank == 0 || self.backing_bw % self.num_bank != 0 {
            return Err(SimError::BandwidthNotDivisibleByBanks {
                bandwidth: self.backing_bw,
                num_bank: self.num_bank,
            });
        }
        if self.num_port == 0 {
            return Err(SimError::InvalidPortCount(self.num_port));
        }
        Ok(())
    }

    /// Total number of addressable elements the buffer can hold.
    pub fn total_size_elems(&self) -> usize {
        self.total_size_bytes / self.word_size.max(1)
    }

    /// Element capacity of the active window, rounded up.
    pub fn active_buf_size(&self) -> usize {
        let total = self.total_size_elems() as f64;
        (total * self.active_buf_frac).ceil() as usize
    }

    /// Element capacity of the prefetch window (the remainder).
    pub fn prefetch_buf_size(&self) -> usize {
        self.total_size_elems() - self.active_buf_size()
    }
}

/// Reads newline- or comma-separated latency samples from a text file for
/// use as [`PortConfig::trace_latencies`].
///
/// # Errors
///
/// Returns [`SimError::TraceUnreadable`] if the file cannot be read or a
/// sample fails to parse as an unsigned integer.
pub fn load_latency_trace(path: &str) -> Result<Vec<u64>, SimError> {
    let text = std::fs::read_to_string(path).map_err(|e| SimError::TraceUnreadable {
        path: path.to_string(),
        reason: e.to_string(),
    })?;
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|e| SimError::TraceUnreadable {
                path: path.to_string(),
                reason: format!("invalid latency sample {s:?}: {e}"),
            })
        })
        .collect()
}
