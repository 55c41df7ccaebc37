//! Shared fixtures for the buffer simulator's integration tests.

use sram_buffer_sim::config::{BufferConfig, LatencyMode, PortConfig};

/// A read-only-stream address type alias matching the crate's own.
pub type Address = i64;

/// Builds a config with explicit control over the knobs that scenario and
/// invariant tests vary most: bandwidth, active fraction, bank/port count,
/// and layout-evaluation mode. Total capacity defaults to 4096 one-byte
/// words; use [`config_sized`] when a scenario needs an exact element
/// count. The read port uses a constant latency with a generous queue;
/// override fields on the returned value for trace-mode tests.
pub fn config(bandwidth: usize, active_frac: f64, num_bank: usize, num_port: usize, layout: bool) -> BufferConfig {
    config_sized(4096, bandwidth, active_frac, num_bank, num_port, layout)
}

/// Like [`config`] but with an explicit total capacity (in one-byte words).
#[allow(clippy::too_many_arguments)]
pub fn config_sized(
    total_size_bytes: usize,
    bandwidth: usize,
    active_frac: f64,
    num_bank: usize,
    num_port: usize,
    layout: bool,
) -> BufferConfig {
    BufferConfig {
        total_size_bytes,
        word_size: 1,
        active_buf_frac: active_frac,
        hit_latency: 1,
        backing_bw: bandwidth,
        num_bank,
        num_port,
        enable_layout_evaluation: layout,
        use_ramulator_trace: false,
        read_port: PortConfig {
            latency_mode: LatencyMode::Constant,
            constant_latency: 1,
            queue_size: 100,
            trace_latencies: vec![],
        },
        write_port: PortConfig::default_write(),
    }
}

/// A contiguous logical address stream `0..n`, wrapped in the single-row
/// shape `set_fetch_matrix` expects.
pub fn contiguous_stream(n: i64) -> Vec<Vec<Address>> {
    vec![(0..n).collect()]
}
