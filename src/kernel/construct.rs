//! Parallel kernel-matrix construction
//!
//! Gap patterns are the unit of work: a fixed-size worker pool takes
//! patterns off the shared iterator, each worker sorts and accumulates its
//! pattern into the lock-sharded matrix, and the parallel iterator's end is
//! the join barrier after which the matrix is frozen read-only.

use crate::core::{GksvmConfig, GksvmError, Result};
use crate::data::SequencePool;
use crate::kernel::accumulator::accumulate_pattern;
use crate::kernel::gmers::GmerSet;
use crate::kernel::matrix::{ShardedTriMatrix, TriMatrix};
use crate::kernel::patterns::enumerate_patterns;
use log::info;
use rayon::prelude::*;

/// Build the merged train+test gapped k-mer matrix.
///
/// The window-length precondition is checked before any allocation or
/// thread spawn; a violation aborts with a configuration error naming the
/// offending corpus.
pub fn construct_kernel(pool: &SequencePool, config: &GksvmConfig) -> Result<TriMatrix> {
    pool.validate_window(config.g)?;

    let patterns = enumerate_patterns(config.g, config.m);
    let gmers = GmerSet::extract(pool, config.g);
    info!(
        "g = {}, k = {}, {} gap patterns over {} windows from {} sequences",
        config.g,
        config.k(),
        patterns.len(),
        gmers.len(),
        pool.total()
    );

    let shared = ShardedTriMatrix::zeroed(pool.total(), config.num_shards)?;
    let dict_size = pool.dict_size();

    let workers = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_threads())
        .build()
        .map_err(|e| GksvmError::InvalidParameter(format!("worker pool: {e}")))?;

    workers.install(|| {
        patterns.par_iter().for_each(|pattern| {
            accumulate_pattern(&gmers, pattern, dict_size, &shared);
        });
    });

    info!("kernel accumulation complete");
    Ok(shared.freeze())
}
