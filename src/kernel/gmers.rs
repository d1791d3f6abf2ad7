//! g-mer window extraction
//!
//! Every length-`g` window of every arena sequence, flattened into one store
//! shared by all gap patterns. Extraction is a pure function of sequence
//! content, so the occurrence set is reproducible regardless of scheduling.

use crate::data::SequencePool;

/// Flat store of all g-mer windows: `len() * g` symbol codes plus the source
/// sequence id of each window.
#[derive(Debug)]
pub struct GmerSet {
    codes: Vec<u16>,
    seq_ids: Vec<u32>,
    g: usize,
}

impl GmerSet {
    /// Extract every valid window (`start in 0..=len - g`) from every
    /// sequence. Callers must have validated `g` against the shortest
    /// sequence already.
    pub fn extract(pool: &SequencePool, g: usize) -> Self {
        let mut codes = Vec::new();
        let mut seq_ids = Vec::new();
        for id in 0..pool.total() {
            let seq = pool.sequence(id);
            debug_assert!(seq.len() >= g);
            for window in seq.windows(g) {
                codes.extend_from_slice(window);
                seq_ids.push(id as u32);
            }
        }
        Self { codes, seq_ids, g }
    }

    /// Number of windows across all sequences.
    pub fn len(&self) -> usize {
        self.seq_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq_ids.is_empty()
    }

    pub fn g(&self) -> usize {
        self.g
    }

    /// The `g` symbol codes of window `w`.
    #[inline]
    pub fn window(&self, w: usize) -> &[u16] {
        &self.codes[w * self.g..(w + 1) * self.g]
    }

    /// Source sequence id of window `w`.
    #[inline]
    pub fn seq_id(&self, w: usize) -> u32 {
        self.seq_ids[w]
    }
}
