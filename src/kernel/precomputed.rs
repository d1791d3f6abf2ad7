//! Precomputed gapped k-mer kernel
//!
//! The exact-match kernel never recomputes anything at solve time: samples
//! carry their arena ids and every evaluation is a triangular lookup into
//! the shared matrix built by the accumulation phase.

use crate::core::Sample;
use crate::kernel::matrix::TriMatrix;
use crate::kernel::Kernel;
use std::sync::Arc;

/// Lookup kernel over the frozen gapped k-mer matrix.
#[derive(Clone)]
pub struct PrecomputedKernel {
    matrix: Arc<TriMatrix>,
}

impl PrecomputedKernel {
    pub fn new(matrix: Arc<TriMatrix>) -> Self {
        Self { matrix }
    }
}

impl Kernel for PrecomputedKernel {
    fn compute(&self, x: &Sample, y: &Sample) -> f64 {
        self.matrix.value(x.id, y.id)
    }

    // A lookup is cheaper than the cache bookkeeping.
    fn cacheable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::matrix::ShardedTriMatrix;

    #[test]
    fn test_precomputed_lookup_is_symmetric() {
        let sharded = ShardedTriMatrix::zeroed(3, 2).unwrap();
        sharded.add(0, 1, 2.0);
        sharded.add(1, 2, 7.0);
        let kernel = PrecomputedKernel::new(Arc::new(sharded.freeze()));

        let a = Sample::new(0, Vec::new(), 1.0);
        let b = Sample::new(1, Vec::new(), -1.0);
        let c = Sample::new(2, Vec::new(), 1.0);

        assert_eq!(kernel.compute(&a, &b), 2.0);
        assert_eq!(kernel.compute(&b, &a), 2.0);
        assert_eq!(kernel.compute(&b, &c), 7.0);
        assert_eq!(kernel.compute(&a, &c), 0.0);
        assert!(!kernel.cacheable());
    }
}
