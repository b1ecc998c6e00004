//! Bulk construction: recursive median partitioning with randomized axis
//! sampling.
//!
//! Samples `min(N, 2 + 2*log2(N))` candidate axes per node, scores each by
//! `(n - |leftSize - rightSize|) / (n - (n mod 2))`, and short-circuits on
//! the first candidate whose score clears 0.9.

use rand::Rng;

use super::node::{Node, NodeId};
use crate::hyperbox::Split;
use crate::tree::Entry;

/// `max(2, floor(2 * CACHE_LINE_BYTES / size_of::<Point<T, N>>()))`.
///
/// A node is a leaf iff its entry count is at most this bound, or no
/// viable split was found for it.
pub(crate) const fn max_leaf_elements<T, const N: usize>() -> usize {
    const CACHE_LINE_BYTES: usize = 64;
    let point_size = std::mem::size_of::<crate::point::Point<T, N>>();
    if point_size == 0 {
        return 2;
    }
    let bound = (2 * CACHE_LINE_BYTES) / point_size;
    if bound < 2 {
        2
    } else {
        bound
    }
}

const VIABLE_SCORE_THRESHOLD: f64 = 0.9;

struct SplitRecord<T> {
    score: f64,
    split: Split<T>,
}

/// Recursively builds a node (and its subtree) over `entries`, whose first
/// element sits at `base_offset` in the tree's entry array, re-partitioning
/// the slice in place.
pub(crate) fn build_node<T, const N: usize, L>(
    entries: &mut [Entry<T, N, L>],
    base_offset: usize,
    depth: usize,
    arena: &mut Vec<Node<T>>,
    rng: &mut impl Rng,
) -> NodeId
where
    T: PartialOrd + Copy,
{
    debug_assert!(depth <= 64, "k-d tree depth exceeded the 64-level invariant");

    let max_leaf = max_leaf_elements::<T, N>();
    if entries.len() <= max_leaf {
        return push_leaf(arena, base_offset, entries.len());
    }

    match find_approximate_split::<T, N, L>(entries, rng) {
        None => push_leaf(arena, base_offset, entries.len()),
        Some(split) => {
            let mid = partition_by_split(entries, &split);
            let (left_entries, right_entries) = entries.split_at_mut(mid);

            let left = build_node(left_entries, base_offset, depth + 1, arena, rng);
            let right = build_node(right_entries, base_offset + mid, depth + 1, arena, rng);

            arena.push(Node::Inner { split, left, right });
            NodeId(u32::try_from(arena.len() - 1).expect("arena grew past u32::MAX nodes"))
        }
    }
}

fn push_leaf<T>(arena: &mut Vec<Node<T>>, base_offset: usize, len: usize) -> NodeId {
    arena.push(Node::Leaf(base_offset..base_offset + len));
    NodeId(u32::try_from(arena.len() - 1).expect("arena grew past u32::MAX nodes"))
}

/// Samples up to `min(N, 2 + 2*log2(N))` random axes, accepting the first
/// split whose balance score exceeds [`VIABLE_SCORE_THRESHOLD`]. If none
/// does, returns the highest-scoring split seen, provided its score is
/// positive; otherwise returns `None` (no viable split — the caller should
/// emit a leaf, e.g. because all points coincide).
fn find_approximate_split<T, const N: usize, L>(entries: &mut [Entry<T, N, L>], rng: &mut impl Rng) -> Option<Split<T>>
where
    T: PartialOrd + Copy,
{
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = {
        let bound = 2.0 + 2.0 * (N as f64).log2();
        (bound as usize).min(N).max(1)
    };

    let mut best: Option<SplitRecord<T>> = None;

    for _ in 0..num_samples {
        let axis = rng.gen_range(0..N);
        let record = try_split(entries, axis);
        if record.score > VIABLE_SCORE_THRESHOLD {
            return Some(record.split);
        }
        let replace = match &best {
            Some(b) => record.score > b.score,
            None => true,
        };
        if replace {
            best = Some(record);
        }
    }

    best.filter(|b| b.score > 0.0).map(|b| b.split)
}

/// Finds the median value along `axis` by n-th-element partitioning, then
/// partitions the slice around that value and scores the resulting balance.
///
/// This mutates `entries`'s order as a side effect (both the n-th-element
/// step and the scoring partition); the reordering is harmless because the
/// *final* split of the accepted axis is re-applied with a fresh
/// value-based partition in [`partition_by_split`].
fn try_split<T, const N: usize, L>(entries: &mut [Entry<T, N, L>], axis: usize) -> SplitRecord<T>
where
    T: PartialOrd + Copy,
{
    let n = entries.len();
    let mid = n / 2;
    entries.select_nth_unstable_by(mid, |a, b| {
        a.coord[axis].partial_cmp(&b.coord[axis]).unwrap_or(std::cmp::Ordering::Equal)
    });
    let median = entries[mid].coord[axis];

    let left_size = partition_by_value(entries, axis, median);
    let right_size = n - left_size;

    let size_diff = (left_size as isize - right_size as isize).unsigned_abs();
    let max_abs_inv_score = n - (n % 2);
    let abs_inv_score = n - size_diff;

    #[allow(clippy::cast_precision_loss)]
    let score = if max_abs_inv_score == 0 {
        0.0
    } else {
        abs_inv_score as f64 / max_abs_inv_score as f64
    };

    SplitRecord { score, split: Split { axis, value: median } }
}

/// In-place, unstable (order-disturbing but value-correct) partition:
/// entries with `coord[axis] < value` end up in `entries[..k]`, the rest in
/// `entries[k..]`. Returns `k`.
fn partition_by_value<T, const N: usize, L>(entries: &mut [Entry<T, N, L>], axis: usize, value: T) -> usize
where
    T: PartialOrd + Copy,
{
    let mut i = 0;
    let mut j = entries.len();
    while i < j {
        if entries[i].coord[axis] < value {
            i += 1;
        } else {
            j -= 1;
            entries.swap(i, j);
        }
    }
    i
}

fn partition_by_split<T, const N: usize, L>(entries: &mut [Entry<T, N, L>], split: &Split<T>) -> usize
where
    T: PartialOrd + Copy,
{
    partition_by_value(entries, split.axis, split.value)
}
