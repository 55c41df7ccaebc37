//! The top-level double-buffered read SRAM: ties the fetch matrix, hashed
//! line index, double-buffer state machine, and backing ports together
//! behind the servicing interface the systolic array drives.

use tracing::{debug, info};

use crate::backing::write_port::WritePort;
use crate::backing::BackingPort;
use crate::common::address::{Address, SENTINEL};
use crate::common::error::SimError;
use crate::config::BufferConfig;
use crate::double_buffer::{DoubleBuffer, WindowSizing};
use crate::fetch_matrix::FetchMatrix;
use crate::hashed_index::HashedIndex;
use crate::trace::{TraceMatrix, TraceRow};

/// The fetch matrix, hashed line index, and double-buffer state installed
/// together by [`ReadBuffer::set_fetch_matrix`].
///
/// Grouping them behind one `Option` means `service_reads` matches them once
/// instead of unwrapping three independently-optional fields that are only
/// ever meaningfully present or absent as a unit.
#[derive(Debug)]
struct Loaded {
    fetch_matrix: FetchMatrix,
    index: HashedIndex,
    double_buffer: DoubleBuffer,
}

/// A cycle-accurate, double-buffered read SRAM sitting between a systolic
/// array and DRAM.
///
/// Construct with [`ReadBuffer::new`], load the logical address stream with
/// [`ReadBuffer::set_fetch_matrix`], then drive it a batch at a time with
/// [`ReadBuffer::service_reads`].
#[derive(Debug)]
pub struct ReadBuffer {
    config: BufferConfig,
    loaded: Option<Loaded>,
    read_port: BackingPort,
    write_port: WritePort,
    trace: TraceMatrix,
    num_access: u64,
}

impl ReadBuffer {
    /// Builds a buffer from a validated configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`BufferConfig::validate`]'s errors.
    pub fn new(config: BufferConfig) -> Result<Self, SimError> {
        config.validate()?;
        let read_port = BackingPort::new_read(&config.read_port);
        let write_port = WritePort::new(&config.write_port);
        Ok(Self {
            config,
            loaded: None,
            read_port,
            write_port,
            trace: TraceMatrix::new(),
            num_access: 0,
        })
    }

    /// Loads the logical address stream the buffer will serve, rebuilding
    /// the fetch matrix, hashed line index, and double-buffer window
    /// sizing from it.
    pub fn set_fetch_matrix(&mut self, logical: &[Vec<Address>]) {
        let fetch_matrix = FetchMatrix::build(logical, self.config.backing_bw);
        let index = HashedIndex::build(
            &fetch_matrix,
            self.config.total_size_elems(),
            self.config.active_buf_size(),
            self.config.prefetch_buf_size(),
            self.config.enable_layout_evaluation,
        );
        debug!(
            num_lines = index.num_lines(),
            elems_per_set = index.elems_per_set(),
            "fetch matrix loaded"
        );
        let double_buffer = DoubleBuffer::new(&index);
        self.loaded = Some(Loaded {
            fetch_matrix,
            index,
            double_buffer,
        });
    }

    /// The rows recorded in the access trace so far, in completion order.
    pub fn trace_rows(&self) -> &[TraceRow] {
        self.trace.rows()
    }

    fn sizing(&self) -> WindowSizing {
        WindowSizing {
            active_buf_size: self.config.active_buf_size(),
            prefetch_buf_size: self.config.prefetch_buf_size(),
            bandwidth: self.config.backing_bw,
        }
    }

    /// Services one batch of read requests from the systolic array.
    ///
    /// `requests[i]` is the (sentinel-padded) row of addresses arriving at
    /// `cycles[i]`. Returns the completion cycle for each row, in order.
    /// Performs the double buffer's initial fill on the first call.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Invariant`] if [`ReadBuffer::set_fetch_matrix`]
    /// has not been called yet.
    pub fn service_reads(
        &mut self,
        requests: &[Vec<Address>],
        cycles: &[i64],
    ) -> Result<Vec<i64>, SimError> {
        let loaded = self
            .loaded
            .as_mut()
            .ok_or(SimError::Invariant("fetch matrix not set"))?;
        let sizing = self.sizing();

        let mut dram_stall_cycles = 0i64;
        if !loaded.double_buffer.is_ready() {
            let start_cycle = cycles.first().copied().unwrap_or(0);
            dram_stall_cycles = loaded.double_buffer.prefetch_active_buffer(
                start_cycle,
                &loaded.fetch_matrix,
                sizing,
                &mut self.read_port,
                &mut self.trace,
                &mut self.num_access,
            );
        }

        let bw_per_bank = (self.config.backing_bw / self.config.num_bank.max(1)).max(1);

        let mut offset = self.config.hit_latency as i64;
        let mut out = Vec::with_capacity(requests.len());

        for (row, &cycle) in requests.iter().zip(cycles.iter()) {
            if self.config.enable_layout_evaluation {
                let mut concurrent_lines: Vec<Vec<usize>> = vec![Vec::new(); self.config.num_bank.max(1)];
                for &addr in row {
                    if addr == SENTINEL {
                        continue;
                    }
                    let (line_id, column) = loop {
                        if let Some(hit) = loaded.double_buffer.active_buffer_hit(&loaded.index, addr, true) {
                            break hit;
                        }
                        loaded.double_buffer.new_prefetch(
                            &loaded.fetch_matrix,
                            sizing,
                            &mut self.read_port,
                            &mut self.trace,
                            &mut self.num_access,
                        );
                        let potential_stall = loaded.double_buffer.last_prefetch_cycle() - (cycle + offset);
                        if potential_stall > 0 {
                            offset += potential_stall;
                        }
                    };
                    let bank_id = column / bw_per_bank;
                    debug_assert!(bank_id < self.config.num_bank.max(1));
                    if !concurrent_lines[bank_id].contains(&line_id) {
                        concurrent_lines[bank_id].push(line_id);
                    }
                }
                let max_lines = concurrent_lines.iter().map(Vec::len).max().unwrap_or(0);
                offset += max_lines.div_ceil(self.config.num_port.max(1)) as i64 - 1;
            } else {
                for &addr in row {
                    if addr == SENTINEL {
                        continue;
                    }
                    while loaded
                        .double_buffer
                        .active_buffer_hit(&loaded.index, addr, false)
                        .is_none()
                    {
                        loaded.double_buffer.new_prefetch(
                            &loaded.fetch_matrix,
                            sizing,
                            &mut self.read_port,
                            &mut self.trace,
                            &mut self.num_access,
                        );
                        let potential_stall = loaded.double_buffer.last_prefetch_cycle() - (cycle + offset);
                        if potential_stall > 0 {
                            offset += potential_stall;
                        }
                    }
                }
            }

            let out_cycle = if self.config.use_ramulator_trace {
                cycle + offset + dram_stall_cycles
            } else {
                cycle + offset
            };
            out.push(out_cycle);
        }

        Ok(out)
    }

    /// Services one batch of write requests. Entirely independent of the
    /// read-side double buffer.
    pub fn service_writes(&mut self, cycles: &[i64]) -> Vec<i64> {
        self.write_port.service_writes(cycles)
    }

    /// The configured hit latency.
    pub fn hit_latency(&self) -> u64 {
        self.config.hit_latency
    }

    /// Total elements moved to/from DRAM so far, across initial fill and
    /// every rotation.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Invariant`] if no trace has been recorded yet.
    pub fn num_accesses(&self) -> Result<u64, SimError> {
        if self.trace.is_empty() {
            return Err(SimError::Invariant("traces not ready yet"));
        }
        Ok(self.num_access)
    }

    /// The earliest and latest response cycles logged in the trace.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Invariant`] if no trace has been recorded yet.
    pub fn external_access_start_stop_cycles(&self) -> Result<(i64, i64), SimError> {
        self.trace.start_stop_cycles()
    }

    /// Writes the accumulated trace to `path` as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceUnreadable`] if the file cannot be written.
    pub fn print_trace(&self, path: &str) -> Result<(), SimError> {
        self.trace.print_trace(path)
    }

    /// Clears simulation state (fetch matrix, double buffer, trace, access
    /// counters, and both ports) while keeping the current configuration.
    ///
    /// This differs from the reference buffer model, whose own `reset`
    /// clobbers the user's configured sizes back to the library's
    /// constructor defaults; resetting runtime state without discarding a
    /// caller's configuration is the more useful contract for a reusable
    /// simulator instance.
    pub fn reset(&mut self) {
        self.read_port = BackingPort::new_read(&self.config.read_port);
        self.write_port = WritePort::new(&self.config.write_port);
        self.loaded = None;
        self.trace = TraceMatrix::new();
        self.num_access = 0;
        info!("buffer reset");
    }
}
