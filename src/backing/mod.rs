//! The DRAM-facing side of the buffer: a constant- or trace-latency port
//! with an in-flight request queue that derives stall cycles from queue
//! pressure.
//!
//! The read and write sides of the reference model ([`scale-sim`'s
//! `read_port`/`write_port`][upstream]) are near-identical duplicates
//! differing only in their default latency. Rather than carry that
//! duplication into Rust, [`BackingPort`] implements the shared engine once
//! and [`write_port::WritePort`] wraps it with write-side defaults and
//! naming.
//!
//! [upstream]: https://github.com/scalesim-project/scale-sim-v2

use tracing::{trace, warn};

use crate::config::{defaults, LatencyMode, PortConfig};

/// Which side of the buffer a [`BackingPort`] is servicing. Currently only
/// distinguishes the ports for naming and default-construction purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Read-side port.
    Read,
    /// Write-side port.
    Write,
}

/// A DRAM-facing port modeling round-trip latency and in-flight queue
/// pressure, shared by the read and write sides of the buffer.
#[derive(Debug, Clone)]
pub struct BackingPort {
    role: Role,
    latency_mode: LatencyMode,
    constant_latency: u64,
    queue_size: usize,
    trace_latencies: Vec<u64>,
    trace_cursor: usize,
    in_flight: Vec<i64>,
    stall_cycles: i64,
}

impl BackingPort {
    /// Builds a port for `role` from `config`.
    pub fn new(role: Role, config: &PortConfig) -> Self {
        Self {
            role,
            latency_mode: config.latency_mode,
            constant_latency: config.constant_latency,
            queue_size: config.queue_size.max(1),
            trace_latencies: config.trace_latencies.clone(),
            trace_cursor: 0,
            in_flight: Vec::new(),
            stall_cycles: 0,
        }
    }

    /// The constant-mode latency, also used by the double-buffer's
    /// prefetch scheduler as the nominal round-trip latency regardless of
    /// `latency_mode`.
    pub fn fallback_latency(&self) -> u64 {
        self.constant_latency
    }

    /// Services a batch of requests arriving at `cycles`, returning their
    /// completion cycles in the same order.
    ///
    /// In [`LatencyMode::Constant`] this is a stateless `+ constant_latency`
    /// on every entry. In [`LatencyMode::Trace`] each request draws its own
    /// latency from the trace (or the constant fallback once the trace is
    /// exhausted), accumulates into a running `stall_cycles` derived from
    /// in-flight queue pressure, and the queue's per-call stall total is
    /// reset to zero at the end of the batch.
    pub fn service(&mut self, cycles: &[i64]) -> Vec<i64> {
        match self.latency_mode {
            LatencyMode::Constant => cycles
                .iter()
                .map(|c| c + self.constant_latency as i64)
                .collect(),
            LatencyMode::Trace => self.service_trace(cycles),
        }
    }

    /// Read-side alias for [`BackingPort::service`], matching the
    /// terminology used by the double-buffer state machine.
    pub fn service_reads(&mut self, cycles: &[i64]) -> Vec<i64> {
        self.service(cycles)
    }

    /// Builds a read-side port from `config`.
    pub fn new_read(config: &PortConfig) -> Self {
        Self::new(Role::Read, config)
    }

    fn service_trace(&mut self, cycles: &[i64]) -> Vec<i64> {
        let mut out = Vec::with_capacity(cycles.len());
        for &cycle in cycles {
            let latency = self.draw_latency();
            let completion = cycle + self.stall_cycles + latency as i64;
            out.push(completion);
            self.in_flight.push(completion);

            let updated_ts = cycle + self.stall_cycles;
            if self.in_flight.len() == self.queue_size {
                self.in_flight.sort_unstable();
                if self.in_flight[0] >= updated_ts {
                    self.stall_cycles += self.in_flight[0] - updated_ts;
                    self.in_flight.remove(0);
                } else {
                    let evict = self.in_flight.partition_point(|&x| x < updated_ts);
                    self.in_flight.drain(0..evict);
                }
            } else if self.in_flight.len() > self.queue_size {
                let excess = self.in_flight.len() - self.queue_size;
                self.in_flight.drain(0..excess);
            }
        }
        trace!(stall_cycles = self.stall_cycles, "backing port batch serviced");
        self.stall_cycles = 0;
        out
    }

    fn draw_latency(&mut self) -> u64 {
        let raw = if self.trace_cursor < self.trace_latencies.len() {
            let v = self.trace_latencies[self.trace_cursor];
            self.trace_cursor += 1;
            v
        } else {
            self.constant_latency
        };
        if raw > defaults::LATENCY_CLAMP {
            warn!(
                sample = raw,
                fallback = self.constant_latency,
                "trace latency exceeds clamp"
            );
            self.constant_latency
        } else {
            raw
        }
    }
}

/// Symmetric write-side port, see [`write_port`].
pub mod write_port;
