//! The write-side counterpart to [`super::BackingPort`].

use crate::config::PortConfig;

use super::{BackingPort, Role};

/// A DRAM-facing write port. Mirrors [`super::BackingPort`]'s constant/trace
/// latency modes and in-flight queue accounting; the double-buffer state
/// machine never consults it, since prefetching only ever reads.
#[derive(Debug, Clone)]
pub struct WritePort {
    inner: BackingPort,
}

impl WritePort {
    /// Builds a write port from `config`.
    pub fn new(config: &PortConfig) -> Self {
        Self {
            inner: BackingPort::new(Role::Write, config),
        }
    }

    /// Services a batch of write requests arriving at `cycles`, returning
    /// their completion cycles in the same order.
    pub fn service_writes(&mut self, cycles: &[i64]) -> Vec<i64> {
        self.inner.service(cycles)
    }
}
