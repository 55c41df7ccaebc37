use thiserror::Error;

/// Errors raised while configuring or driving the buffer simulator.
///
/// Configuration mistakes (bad fractions, misaligned bandwidth, unreadable
/// trace files) are reported through the `Config*` variants. `Invariant`
/// is reserved for states that should be unreachable given a valid
/// configuration and is raised only from debug-checked internal code paths.
#[derive(Debug, Error)]
pub enum SimError {
    /// `active_buf_frac` must fall in `[0.5, 1.0)`.
    #[error("active_buf_frac must be in [0.5, 1.0), got {0}")]
    InvalidActiveBufFrac(f64),

    /// The backing bandwidth must divide evenly across banks.
    #[error("backing bandwidth {bandwidth} is not divisible by bank count {num_bank}")]
    BandwidthNotDivisibleByBanks {
        /// Configured backing bandwidth, in elements per cycle.
        bandwidth: usize,
        /// Configured number of banks.
        num_bank: usize,
    },

    /// `num_port` must be at least one.
    #[error("num_port must be at least 1, got {0}")]
    InvalidPortCount(usize),

    /// A latency trace file could not be read or parsed.
    #[error("failed to load latency trace from {path}: {reason}")]
    TraceUnreadable {
        /// Path that failed to load.
        path: String,
        /// Underlying I/O or parse failure, rendered as text.
        reason: String,
    },

    /// An internal invariant was violated; indicates a bug rather than a
    /// misconfiguration.
    #[error("internal invariant violated: {0}")]
    Invariant(&'static str),
}
