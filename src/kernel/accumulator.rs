//! Per-pattern occurrence grouping and kernel accumulation
//!
//! For one gap pattern, every window yields a key: the symbol codes at the
//! informative positions. Occurrences are ordered with an LSD counting sort
//! over those positions (keys are short fixed-length tuples over a bounded
//! alphabet, so this stays linear in the window count), then scanned as
//! maximal runs of equal keys. A run holding `c_a` windows of sequence `a`
//! and `c_b` windows of sequence `b` adds `c_a * c_b` to cell `(a, b)` —
//! one unit per co-occurring window pair, diagonal included.

use crate::kernel::gmers::GmerSet;
use crate::kernel::matrix::ShardedTriMatrix;
use crate::kernel::patterns::GapPattern;

/// Apply one gap pattern's contributions to the shared matrix.
pub fn accumulate_pattern(
    gmers: &GmerSet,
    pattern: &GapPattern,
    dict_size: usize,
    matrix: &ShardedTriMatrix,
) {
    let n = gmers.len();
    if n == 0 {
        return;
    }
    let k = pattern.k();

    // Informative-position keys, one row of k codes per window.
    let mut keys: Vec<u16> = Vec::with_capacity(n * k);
    for w in 0..n {
        let window = gmers.window(w);
        for &p in pattern.positions() {
            keys.push(window[p]);
        }
    }

    let order = sort_by_key(&keys, n, k, dict_size);

    // Scan maximal runs of equal keys and push their pair contributions.
    let mut group: Vec<u32> = Vec::new();
    let mut run_start = 0;
    while run_start < n {
        let mut run_end = run_start + 1;
        while run_end < n && key_eq(&keys, k, order[run_start], order[run_end]) {
            run_end += 1;
        }

        group.clear();
        group.extend(order[run_start..run_end].iter().map(|&w| gmers.seq_id(w as usize)));
        group.sort_unstable();
        apply_group(&group, matrix);

        run_start = run_end;
    }
}

/// Stable LSD counting sort of window indices by their k-tuple keys.
/// Bucket 0 is never occupied (symbol codes start at 1) but keeping it makes
/// the code a direct index.
fn sort_by_key(keys: &[u16], n: usize, k: usize, dict_size: usize) -> Vec<u32> {
    let mut order: Vec<u32> = (0..n as u32).collect();
    let mut scratch = vec![0u32; n];
    let mut counts = vec![0usize; dict_size + 1];

    for pos in (0..k).rev() {
        counts.iter_mut().for_each(|c| *c = 0);
        for &w in &order {
            counts[keys[w as usize * k + pos] as usize] += 1;
        }

        // Prefix sums -> starting offsets.
        let mut sum = 0usize;
        for c in counts.iter_mut() {
            let this = *c;
            *c = sum;
            sum += this;
        }

        // Stable scatter.
        for &w in &order {
            let bucket = keys[w as usize * k + pos] as usize;
            scratch[counts[bucket]] = w;
            counts[bucket] += 1;
        }
        std::mem::swap(&mut order, &mut scratch);
    }

    order
}

#[inline]
fn key_eq(keys: &[u16], k: usize, a: u32, b: u32) -> bool {
    let a = a as usize * k;
    let b = b as usize * k;
    keys[a..a + k] == keys[b..b + k]
}

/// Add one match group's contributions: for members `(a, c_a)`, `(b, c_b)`,
/// cell `(a, b)` gains `c_a * c_b`; a sequence pairs with itself too.
fn apply_group(sorted_ids: &[u32], matrix: &ShardedTriMatrix) {
    let mut i = 0;
    while i < sorted_ids.len() {
        let a = sorted_ids[i];
        let mut i_end = i + 1;
        while i_end < sorted_ids.len() && sorted_ids[i_end] == a {
            i_end += 1;
        }
        let count_a = (i_end - i) as f64;
        matrix.add(a as usize, a as usize, count_a * count_a);

        let mut j = i_end;
        while j < sorted_ids.len() {
            let b = sorted_ids[j];
            let mut j_end = j + 1;
            while j_end < sorted_ids.len() && sorted_ids[j_end] == b {
                j_end += 1;
            }
            let count_b = (j_end - j) as f64;
            matrix.add(a as usize, b as usize, count_a * count_b);
            j = j_end;
        }

        i = i_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawCorpus, SequencePool};
    use crate::kernel::patterns::enumerate_patterns;
    use std::io::Cursor;

    fn pool(records: &[(i32, &str)]) -> SequencePool {
        let text: String = records
            .iter()
            .map(|(label, seq)| format!(">{label}\n{seq}\n"))
            .collect();
        let corpus = RawCorpus::from_reader(Cursor::new(text), "mem".to_string()).unwrap();
        SequencePool::build(&corpus, None, None).unwrap().0
    }

    #[test]
    fn test_sort_orders_keys() {
        let pool = pool(&[(1, "BAAB")]);
        let gmers = GmerSet::extract(&pool, 2);
        let pattern = &enumerate_patterns(2, 0)[0];

        let mut keys = Vec::new();
        for w in 0..gmers.len() {
            keys.extend_from_slice(gmers.window(w));
        }
        let order = sort_by_key(&keys, gmers.len(), 2, pool.dict_size());

        // Codes follow first appearance (B=1, A=2), so the windows BA, AA,
        // AB sort as [1,2] < [2,1] < [2,2].
        let sorted: Vec<&[u16]> = order.iter().map(|&w| gmers.window(w as usize)).collect();
        assert_eq!(sorted, vec![&[1, 2][..], &[2, 1][..], &[2, 2][..]]);
    }

    #[test]
    fn test_exact_bigram_reference_matrix() {
        // Train "AABB", "ABAB"; test "ABBB"; g = 2, m = 0.
        let train = {
            let text = ">1\nAABB\n>0\nABAB\n";
            RawCorpus::from_reader(Cursor::new(text), "train".to_string()).unwrap()
        };
        let test = {
            let text = ">1\nABBB\n";
            RawCorpus::from_reader(Cursor::new(text), "test".to_string()).unwrap()
        };
        let (pool, _) = SequencePool::build(&train, Some(&test), None).unwrap();

        let gmers = GmerSet::extract(&pool, 2);
        let patterns = enumerate_patterns(2, 0);
        assert_eq!(patterns.len(), 1);

        let sharded = ShardedTriMatrix::zeroed(3, 4).unwrap();
        accumulate_pattern(&gmers, &patterns[0], pool.dict_size(), &sharded);
        let matrix = sharded.freeze();

        // Bigram multisets: {AA,AB,BB}, {AB,BA,AB}, {AB,BB,BB}.
        assert_eq!(matrix.value(0, 0), 3.0);
        assert_eq!(matrix.value(1, 1), 5.0);
        assert_eq!(matrix.value(2, 2), 5.0);
        assert_eq!(matrix.value(0, 1), 2.0);
        assert_eq!(matrix.value(0, 2), 3.0);
        assert_eq!(matrix.value(1, 2), 2.0);
    }

    #[test]
    fn test_gapped_contributions_sum_over_patterns() {
        // "ABA" vs "ABB" with g = 2, m = 1: patterns keep position 0 or 1.
        let pool = pool(&[(1, "ABA"), (-1, "ABB")]);
        let gmers = GmerSet::extract(&pool, 2);
        let patterns = enumerate_patterns(2, 1);
        assert_eq!(patterns.len(), 2);

        let sharded = ShardedTriMatrix::zeroed(2, 2).unwrap();
        for pattern in &patterns {
            accumulate_pattern(&gmers, pattern, pool.dict_size(), &sharded);
        }
        let matrix = sharded.freeze();

        // Windows: seq0 {AB, BA}, seq1 {AB, BB}.
        // Pattern keeping pos 0: keys seq0 {A, B}, seq1 {A, B} -> cross 2.
        // Pattern keeping pos 1: keys seq0 {B, A}, seq1 {B, B} -> cross 2.
        assert_eq!(matrix.value(0, 1), 4.0);
        // Diagonals: each pattern contributes 2 (distinct keys) for seq0;
        // seq1 gets 1 + 1 under pos 0 and 2 * 2 under pos 1.
        assert_eq!(matrix.value(0, 0), 4.0);
        assert_eq!(matrix.value(1, 1), 6.0);
    }

    #[test]
    fn test_pattern_order_is_irrelevant() {
        let pool = pool(&[(1, "ABCABC"), (-1, "BCABCA"), (1, "CCABAB")]);
        let gmers = GmerSet::extract(&pool, 3);
        let patterns = enumerate_patterns(3, 1);

        let forward = ShardedTriMatrix::zeroed(3, 8).unwrap();
        for pattern in &patterns {
            accumulate_pattern(&gmers, pattern, pool.dict_size(), &forward);
        }
        let forward = forward.freeze();

        let backward = ShardedTriMatrix::zeroed(3, 8).unwrap();
        for pattern in patterns.iter().rev() {
            accumulate_pattern(&gmers, pattern, pool.dict_size(), &backward);
        }
        let backward = backward.freeze();

        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(forward.value(i, j), backward.value(i, j));
            }
        }
    }
}
