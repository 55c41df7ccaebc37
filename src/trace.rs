//! The append-only trace of DRAM prefetch requests and their response
//! cycles, exported as CSV for downstream analysis.

use crate::common::address::Address;
use crate::common::error::SimError;

/// One logged prefetch: the cycle its response became available, and the
/// (sentinel-padded) row of addresses that was requested.
pub type TraceRow = (i64, Vec<Address>);

/// Append-only log of every prefetch issued to the backing port.
#[derive(Debug, Clone, Default)]
pub struct TraceMatrix {
    rows: Vec<TraceRow>,
}

impl TraceMatrix {
    /// An empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one logged row.
    pub fn push(&mut self, response_cycle: i64, request: Vec<Address>) {
        self.rows.push((response_cycle, request));
    }

    /// Appends several rows that shared one prefetch call, in order.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = TraceRow>) {
        self.rows.extend(rows);
    }

    /// Whether any prefetch has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of logged rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Borrows the logged rows in append order.
    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    /// The earliest and latest response cycles logged so far.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Invariant`] if no trace has been recorded yet.
    pub fn start_stop_cycles(&self) -> Result<(i64, i64), SimError> {
        let mut iter = self.rows.iter().map(|(cycle, _)| *cycle);
        let first = iter.next().ok_or(SimError::Invariant("trace not ready"))?;
        let (min, max) = iter.fold((first, first), |(lo, hi), c| (lo.min(c), hi.max(c)));
        Ok((min, max))
    }

    /// Renders the trace as CSV: one line per row, response cycle first.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for (cycle, request) in &self.rows {
            out.push_str(&cycle.to_string());
            for addr in request {
                out.push(',');
                out.push_str(&addr.to_string());
            }
            out.push('\n');
        }
        out
    }

    /// Writes the trace to `path` as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceUnreadable`] if the file cannot be written.
    /// If no trace has been recorded yet, logs a warning and writes nothing.
    pub fn print_trace(&self, path: &str) -> Result<(), SimError> {
        if self.is_empty() {
            tracing::warn!(path, "no trace has been generated yet");
            return Ok(());
        }
        std::fs::write(path, self.to_csv()).map_err(|e| SimError::TraceUnreadable {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}
