//! Row-kernel evaluation cache
//!
//! The linear and RBF paths evaluate kernels over dense kernel-matrix rows,
//! which the SMO inner loop asks for repeatedly. This LRU keeps recent
//! values keyed by the canonicalized sample pair; the precomputed gapped
//! k-mer path bypasses it, a triangular lookup being cheaper than the cache.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache key normalized so that `(i, j)` and `(j, i)` share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PairKey(usize, usize);

impl PairKey {
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self(i, j)
        } else {
            Self(j, i)
        }
    }
}

/// LRU cache of row-kernel values.
pub struct KernelCache {
    entries: LruCache<PairKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Cache holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero after max");
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Size the cache from a memory budget in bytes (key + value + map
    /// overhead per entry).
    pub fn with_memory_limit(memory_bytes: usize) -> Self {
        Self::new((memory_bytes / 32).max(1))
    }

    /// Cached value for the pair, if present.
    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        match self.entries.get(&PairKey::new(i, j)) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        self.entries.put(PairKey::new(i, j), value);
    }

    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
