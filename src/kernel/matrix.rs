//! Triangular kernel matrix storage
//!
//! Only cells with `i <= j` are materialized; `tri_index` canonicalizes both
//! orientations of a pair onto the same slot, which makes symmetry a property
//! of the storage rather than of the accumulation code.

use crate::core::{GksvmError, Result};
use std::sync::Mutex;

/// Cells needed to store an `n x n` symmetric matrix triangularly.
pub fn triangular_len(n: usize) -> Option<usize> {
    n.checked_mul(n + 1).map(|p| p / 2)
}

/// Canonical flat index of `(i, j)` in row-major upper-triangular order.
///
/// Bijective over `i <= j < n`; `tri_index(i, j, n) == tri_index(j, i, n)`.
#[inline]
pub fn tri_index(i: usize, j: usize, n: usize) -> usize {
    let (row, col) = if i <= j { (i, j) } else { (j, i) };
    debug_assert!(col < n);
    row * n - (row * row - row) / 2 + (col - row)
}

/// Frozen symmetric kernel matrix. Read-only after construction.
#[derive(Debug, Clone)]
pub struct TriMatrix {
    values: Vec<f64>,
    n: usize,
}

impl TriMatrix {
    /// Allocate a zeroed matrix, surfacing allocation failure as a typed
    /// error instead of aborting.
    pub fn zeroed(n: usize) -> Result<Self> {
        let len = triangular_len(n).ok_or(GksvmError::Resource {
            what: "kernel matrix",
            cells: usize::MAX,
        })?;
        let mut values = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| GksvmError::Resource {
                what: "kernel matrix",
                cells: len,
            })?;
        values.resize(len, 0.0);
        Ok(Self { values, n })
    }

    pub(crate) fn from_parts(values: Vec<f64>, n: usize) -> Self {
        debug_assert_eq!(Some(values.len()), triangular_len(n));
        Self { values, n }
    }

    /// Matrix dimension (total sequence count).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Value at `(i, j)`; symmetric by construction.
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[tri_index(i, j, self.n)]
    }

    /// Dense row `i` restricted to columns `0..cols`.
    pub fn row(&self, i: usize, cols: usize) -> Vec<f64> {
        (0..cols).map(|j| self.value(i, j)).collect()
    }
}

/// Accumulation-phase view of the matrix: the flat triangular index space is
/// split into contiguous ranges, each guarded by its own mutex. Workers lock
/// only the shard covering the target cell, for the duration of one addition.
pub struct ShardedTriMatrix {
    shards: Vec<Mutex<Vec<f64>>>,
    chunk: usize,
    n: usize,
}

impl ShardedTriMatrix {
    /// Allocate zeroed sharded storage for an `n x n` matrix.
    pub fn zeroed(n: usize, num_shards: usize) -> Result<Self> {
        let len = triangular_len(n).ok_or(GksvmError::Resource {
            what: "kernel matrix",
            cells: usize::MAX,
        })?;
        let num_shards = num_shards.max(1).min(len.max(1));
        let chunk = len.div_ceil(num_shards).max(1);
        let mut shards = Vec::with_capacity(num_shards);
        let mut remaining = len;
        while remaining > 0 {
            let this = chunk.min(remaining);
            let mut values = Vec::new();
            values
                .try_reserve_exact(this)
                .map_err(|_| GksvmError::Resource {
                    what: "kernel matrix",
                    cells: len,
                })?;
            values.resize(this, 0.0);
            shards.push(Mutex::new(values));
            remaining -= this;
        }
        if shards.is_empty() {
            shards.push(Mutex::new(Vec::new()));
        }
        Ok(Self { shards, chunk, n })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Add `delta` to cell `(i, j)` under the covering shard's lock.
    pub fn add(&self, i: usize, j: usize, delta: f64) {
        let idx = tri_index(i, j, self.n);
        let shard = idx / self.chunk;
        let offset = idx % self.chunk;
        let mut values = self.shards[shard].lock().expect("kernel shard poisoned");
        values[offset] += delta;
    }

    /// Join-barrier handoff: collapse the shards into a read-only matrix.
    pub fn freeze(self) -> TriMatrix {
        let mut values = Vec::with_capacity(triangular_len(self.n).unwrap_or(0));
        for shard in self.shards {
            values.extend(shard.into_inner().expect("kernel shard poisoned"));
        }
        TriMatrix::from_parts(values, self.n)
    }
}
