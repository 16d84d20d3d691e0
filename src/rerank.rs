//! Exact reranking of a candidate set.
use std::cmp::Ordering;

use serde::Serialize;

use crate::metric::{cmp_distance, MetricItem, Scalar};
use crate::vptree::BucketEntry;

/// A training sample and its exact distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor<F: Scalar> {
    pub index: usize,
    pub distance: F,
}

fn by_distance_then_index<F: Scalar>(a: &BucketEntry<F>, b: &BucketEntry<F>) -> Ordering {
    cmp_distance(a.distance, b.distance).then(a.index.cmp(&b.index))
}

/// Recompute the exact distance from `query` to every candidate and return
/// the `min(knn, candidates.len())` nearest, ascending by distance with
/// ties ordered by training index.
///
/// Only the selected prefix is sorted.
pub fn rerank<F, T>(
    items: &[T],
    query: &T,
    mut candidates: Vec<BucketEntry<F>>,
    knn: usize,
) -> Vec<Neighbor<F>>
where
    F: Scalar,
    T: MetricItem<F>,
{
    for c in candidates.iter_mut() {
        c.distance = query.distance(&items[c.index]);
    }

    let k = knn.min(candidates.len());
    if k < candidates.len() {
        order_stat::kth_by(&mut candidates, k, by_distance_then_index);
        candidates.truncate(k);
    }
    candidates.sort_by(by_distance_then_index);

    candidates
        .into_iter()
        .map(|c| Neighbor { index: c.index, distance: c.distance })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BinaryVector;

    fn items() -> Vec<BinaryVector> {
        // item i has the low i bits set, so it is i bits away from zero
        (0..10u32)
            .map(|i| BinaryVector::new(vec![(1u64 << i) - 1]))
            .collect()
    }

    fn all(n: usize) -> Vec<BucketEntry<f32>> {
        (0..n).rev().map(BucketEntry::new).collect()
    }

    #[test]
    fn test_top_k_in_order() {
        let items = items();
        let q = BinaryVector::zeros(1);
        let nn = rerank(&items, &q, all(10), 3);
        assert_eq!(
            nn,
            vec![
                Neighbor { index: 0, distance: 0.0 },
                Neighbor { index: 1, distance: 1.0 },
                Neighbor { index: 2, distance: 2.0 },
            ]
        );
    }

    #[test]
    fn test_knn_larger_than_candidates() {
        let items = items();
        let q = BinaryVector::new(vec![(1u64 << 5) - 1]);
        let nn = rerank(&items, &q, all(4), 10);
        assert_eq!(nn.len(), 4);
        let d: Vec<f32> = nn.iter().map(|n| n.distance).collect();
        assert_eq!(d, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_placeholder_distance_ignored() {
        let items = items();
        let q = BinaryVector::zeros(1);
        let cands = vec![
            BucketEntry { distance: 0.0, index: 9 },
            BucketEntry { distance: 100.0, index: 1 },
        ];
        let nn = rerank(&items, &q, cands, 1);
        assert_eq!(nn, vec![Neighbor { index: 1, distance: 1.0 }]);
    }

    #[test]
    fn test_ties_ordered_by_index() {
        let items = vec![
            BinaryVector::new(vec![0b01]),
            BinaryVector::new(vec![0b10]),
            BinaryVector::new(vec![0b11]),
            BinaryVector::new(vec![0b00]),
        ];
        let q = BinaryVector::zeros(1);
        let nn = rerank(&items, &q, all(4), 3);
        let idx: Vec<usize> = nn.iter().map(|n| n.index).collect();
        assert_eq!(idx, vec![3, 0, 1]);
    }

    #[test]
    fn test_empty() {
        let items = items();
        let q = BinaryVector::zeros(1);
        assert!(rerank::<f32, _>(&items, &q, Vec::new(), 5).is_empty());
        assert!(rerank(&items, &q, all(3), 0).is_empty());
    }
}
