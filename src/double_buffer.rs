//! The double-buffer state machine: active/prefetch windows over line IDs,
//! rotated on a miss, with the prefetch cursor that tracks how far through
//! the fetch matrix the next prefetch should start.

use crate::backing::BackingPort;
use crate::common::address::{Address, SENTINEL};
use crate::common::ring::RingRange;
use crate::fetch_matrix::FetchMatrix;
use crate::hashed_index::HashedIndex;
use crate::trace::TraceMatrix;

/// Sizing parameters the double buffer needs for one prefetch call. Passed
/// by value at each call site rather than stored, since they derive from
/// [`crate::config::BufferConfig`] which the caller already owns.
#[derive(Debug, Clone, Copy)]
pub struct WindowSizing {
    /// Element capacity of the active window.
    pub active_buf_size: usize,
    /// Element capacity of the prefetch window.
    pub prefetch_buf_size: usize,
    /// Elements moved per fetch-matrix row.
    pub bandwidth: usize,
}

/// Active/prefetch window state over a ring of line IDs, plus the cursor
/// into the fetch matrix that the next prefetch resumes from.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    active: RingRange,
    prefetch: RingRange,
    num_lines: usize,
    num_active_lines: usize,
    num_prefetch_lines: usize,
    next_line_idx: usize,
    next_col_idx: usize,
    last_prefetch_cycle: i64,
    ready: bool,
}

impl DoubleBuffer {
    /// Builds an uninitialised double buffer sized against `index`. The
    /// first call to [`DoubleBuffer::prefetch_active_buffer`] performs the
    /// initial fill and flips it ready.
    pub fn new(index: &HashedIndex) -> Self {
        let num_lines = index.num_lines().max(1);
        Self {
            active: RingRange::new(0, 0, num_lines),
            prefetch: RingRange::new(0, 0, num_lines),
            num_lines,
            num_active_lines: index.num_active_lines(),
            num_prefetch_lines: index.num_prefetch_lines(),
            next_line_idx: 0,
            next_col_idx: 0,
            last_prefetch_cycle: -1,
            ready: false,
        }
    }

    /// Whether the initial fill has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The most recent prefetch's completion cycle.
    pub fn last_prefetch_cycle(&self) -> i64 {
        self.last_prefetch_cycle
    }

    /// The active window's current line-ID range.
    pub fn active_window(&self) -> RingRange {
        self.active
    }

    /// The prefetch window's current line-ID range.
    pub fn prefetch_window(&self) -> RingRange {
        self.prefetch
    }

    /// Checks whether `addr` is present in the active window.
    ///
    /// Returns `Some((line_id, column))` on a hit. `column` is the address's
    /// insertion-order position within its line when `layout` is set
    /// (needed to resolve a bank in layout-evaluation mode), and `0`
    /// otherwise.
    ///
    /// # Panics
    ///
    /// Panics (debug builds only) if called before the initial fill.
    pub fn active_buffer_hit(
        &self,
        index: &HashedIndex,
        addr: Address,
        layout: bool,
    ) -> Option<(usize, usize)> {
        debug_assert!(self.ready, "active buffer is not ready yet");
        for line_id in self.active.iter() {
            let line = index.line(line_id);
            if let Some(col) = line.column_of(addr) {
                return Some((line_id, if layout { col } else { 0 }));
            }
        }
        None
    }

    /// Performs the initial fill: fetches enough rows from `fetch_matrix` to
    /// cover the active window's element capacity, installs the active and
    /// prefetch windows at `[0, num_active_lines)` and
    /// `[num_active_lines, num_active_lines + num_prefetch_lines)`, and
    /// returns the DRAM stall observed while filling (clamped to zero).
    #[allow(clippy::too_many_arguments)]
    pub fn prefetch_active_buffer(
        &mut self,
        start_cycle: i64,
        fetch_matrix: &FetchMatrix,
        sizing: WindowSizing,
        backing: &mut BackingPort,
        trace: &mut TraceMatrix,
        num_access: &mut u64,
    ) -> i64 {
        let rows_f = fetch_matrix.rows().max(1);
        let mut n = sizing.active_buf_size.div_ceil(sizing.bandwidth.max(1));
        if n >= rows_f {
            n = rows_f;
        }
        let requested_data_size = n * sizing.bandwidth;
        *num_access += requested_data_size as u64;

        let mut block: Vec<Vec<Address>> = (0..n).map(|r| fetch_matrix.row(r).to_vec()).collect();

        self.next_col_idx = 0;
        if requested_data_size > sizing.active_buf_size {
            let valid_cols = sizing.active_buf_size % sizing.bandwidth;
            self.next_col_idx = valid_cols;
            if let Some(last) = block.last_mut() {
                for col in valid_cols..sizing.bandwidth {
                    last[col] = SENTINEL;
                }
            }
        }

        let latency = backing.fallback_latency() as i64;
        let cycles: Vec<i64> = (0..n as i64)
            .map(|i| start_cycle - n as i64 + i - latency)
            .collect();

        let responses = backing.service_reads(&cycles);
        self.last_prefetch_cycle = responses.iter().copied().max().unwrap_or(start_cycle);
        trace.extend(responses.iter().copied().zip(block));

        self.active = RingRange::new(0, self.num_active_lines, self.num_lines);
        self.prefetch = RingRange::new(self.num_active_lines, self.num_prefetch_lines, self.num_lines);
        self.ready = true;

        self.next_line_idx = if requested_data_size > sizing.active_buf_size {
            n % rows_f
        } else {
            (n + 1) % rows_f
        };

        let last_raw_cycle = *cycles.last().unwrap_or(&start_cycle);
        (self.last_prefetch_cycle - last_raw_cycle - 1).max(0)
    }

    /// Rotates the active/prefetch windows forward by one prefetch-window's
    /// worth of lines and issues the next prefetch from `next_line_idx`,
    /// wrapping through the start of the fetch matrix if needed.
    ///
    /// The block masking below reuses `sizing.active_buf_size` (not
    /// `prefetch_buf_size`) as the surplus threshold for both the leading
    /// and trailing column chomps; that asymmetry is carried over unchanged
    /// from the reference buffer model's own rotation routine.
    #[allow(clippy::too_many_arguments)]
    pub fn new_prefetch(
        &mut self,
        fetch_matrix: &FetchMatrix,
        sizing: WindowSizing,
        backing: &mut BackingPort,
        trace: &mut TraceMatrix,
        num_access: &mut u64,
    ) {
        debug_assert!(self.ready, "active buffer is empty");
        let rows_f = fetch_matrix.rows().max(1);

        let new_active_start = (self.active.start() + self.num_prefetch_lines) % self.num_lines;
        let prefetch_start = (new_active_start + self.num_active_lines) % self.num_lines;
        self.active = RingRange::new(new_active_start, self.num_active_lines, self.num_lines);
        self.prefetch = RingRange::new(prefetch_start, self.num_prefetch_lines, self.num_lines);

        let start_idx = self.next_line_idx;
        let n = sizing.prefetch_buf_size.div_ceil(sizing.bandwidth.max(1));
        let end_idx = start_idx + n;
        let requested_data_size = n * sizing.bandwidth;
        *num_access += requested_data_size as u64;

        let mut block: Vec<Vec<Address>> = if end_idx > rows_f {
            let mut b: Vec<Vec<Address>> =
                (start_idx..rows_f).map(|r| fetch_matrix.row(r).to_vec()).collect();
            let new_end_idx = (end_idx - rows_f).min(start_idx);
            b.extend((0..new_end_idx).map(|r| fetch_matrix.row(r).to_vec()));
            b
        } else {
            (start_idx..end_idx).map(|r| fetch_matrix.row(r).to_vec()).collect()
        };

        if let Some(first) = block.first_mut() {
            let chomp = self.next_col_idx.min(first.len());
            for col in first.iter_mut().take(chomp) {
                *col = SENTINEL;
            }
        }

        if requested_data_size > sizing.active_buf_size {
            let valid_cols = sizing.active_buf_size % sizing.bandwidth;
            if let Some(last) = block.last_mut() {
                for col in valid_cols..sizing.bandwidth {
                    last[col] = SENTINEL;
                }
            }
        }

        let cycles: Vec<i64> = (0..n as i64)
            .map(|i| self.last_prefetch_cycle + i + 1)
            .collect();
        let responses = backing.service_reads(&cycles);
        self.last_prefetch_cycle = responses
            .iter()
            .copied()
            .max()
            .unwrap_or(self.last_prefetch_cycle);
        trace.extend(responses.iter().copied().zip(block));

        self.next_line_idx = if requested_data_size > sizing.active_buf_size {
            n % rows_f
        } else {
            (n + 1) % rows_f
        };
    }
}
