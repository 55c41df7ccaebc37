//! Cycle-accurate simulator of a double-buffered on-chip read SRAM sitting
//! between a systolic compute array and DRAM.
//!
//! The buffer is organised as five cooperating pieces:
//!
//! - [`fetch_matrix`]: reshapes a logical address stream into bandwidth-wide
//!   rows.
//! - [`hashed_index`]: partitions the fetch matrix into fixed-size lines for
//!   O(1) membership and (in layout-evaluation mode) bank-column lookup.
//! - [`double_buffer`]: the active/prefetch window state machine, rotated on
//!   a miss.
//! - [`backing`]: the DRAM-facing read and write ports, modeling constant or
//!   trace-replay latency and in-flight queue stalls.
//! - [`buffer`]: [`buffer::ReadBuffer`], the servicing interface the
//!   systolic array drives.
//!
//! # Example
//!
//! ```
//! use sram_buffer_sim::buffer::ReadBuffer;
//! use sram_buffer_sim::config::BufferConfig;
//!
//! let mut buf = ReadBuffer::new(BufferConfig::default()).unwrap();
//! let stream: Vec<i64> = (0..4096).collect();
//! buf.set_fetch_matrix(&[stream]);
//!
//! let requests = vec![vec![0, 1, 2, 3]];
//! let completions = buf.service_reads(&requests, &[0]).unwrap();
//! assert_eq!(completions.len(), 1);
//! ```

pub mod backing;
pub mod buffer;
pub mod common;
pub mod config;
pub mod double_buffer;
pub mod fetch_matrix;
pub mod hashed_index;
pub mod trace;

pub use buffer::ReadBuffer;
pub use common::error::SimError;
pub use config::BufferConfig;
