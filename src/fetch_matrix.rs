//! Reshapes a logical address stream into bandwidth-wide rows.

use crate::common::address::{Address, SENTINEL};

/// A bandwidth-wide, row-major view of a logical address stream.
///
/// Rows shorter than `bandwidth` elements (only possible for the final row)
/// are padded on the right with [`SENTINEL`].
#[derive(Debug, Clone)]
pub struct FetchMatrix {
    rows: Vec<Vec<Address>>,
    bandwidth: usize,
}

impl FetchMatrix {
    /// Flattens `logical` in row-major order and repacks it into
    /// `bandwidth`-wide rows, padding the final row with [`SENTINEL`] if it
    /// does not divide evenly.
    ///
    /// # Panics
    ///
    /// Panics if `bandwidth` is zero.
    pub fn build(logical: &[Vec<Address>], bandwidth: usize) -> Self {
        assert!(bandwidth > 0, "fetch matrix bandwidth must be positive");
        let flat: Vec<Address> = logical.iter().flatten().copied().collect();
        let num_rows = flat.len().div_ceil(bandwidth);
        let mut rows = vec![vec![SENTINEL; bandwidth]; num_rows];
        for (i, &addr) in flat.iter().enumerate() {
            rows[i / bandwidth][i % bandwidth] = addr;
        }
        Self { rows, bandwidth }
    }

    /// Number of rows in the matrix.
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// The configured bandwidth (row width).
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    /// Borrows row `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.rows()`.
    pub fn row(&self, idx: usize) -> &[Address] {
        &self.rows[idx]
    }
}
