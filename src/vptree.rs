//! Vantage-point trees with leaf buckets, searched by single-path descent.
//!
//! Each internal node holds a vantage point and the median distance of its
//! partition to that point; entries closer than the median go left, the
//! rest go right. Splitting stops once a partition holds at most
//! `min_size` entries, and the partition becomes a leaf bucket. A query
//! follows exactly one root-to-leaf path and gets that bucket back as its
//! candidate set.
use std::collections::VecDeque;

use rand::Rng;

use crate::error::{ForestError, Result};
use crate::median::quick_select_by;
use crate::metric::{cmp_distance, MetricItem, Scalar};

/// Index of a node in a tree's arena. The root is always `0`.
pub type NodeId = usize;

/// One training sample reference stored in a bucket.
///
/// `distance` is the distance to the vantage point of the split that
/// produced the bucket (zero in a root leaf). It is a placeholder: callers
/// that need exact distances recompute them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketEntry<F: Scalar> {
    pub distance: F,
    pub index: usize,
}

impl<F: Scalar> BucketEntry<F> {
    pub fn new(index: usize) -> Self {
        BucketEntry { distance: F::zero(), index: index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node<F: Scalar> {
    Internal {
        vantage: usize,
        median: F,
        left: NodeId,
        right: NodeId,
    },
    Leaf {
        bucket: Vec<BucketEntry<F>>,
    },
}

impl<F: Scalar> Node<F> {
    pub fn is_leaf(&self) -> bool {
        match *self {
            Node::Leaf { .. } => true,
            Node::Internal { .. } => false,
        }
    }

    /// The bucket of a leaf; internal nodes have none.
    pub fn bucket(&self) -> &[BucketEntry<F>] {
        match *self {
            Node::Leaf { ref bucket } => bucket.as_slice(),
            Node::Internal { .. } => &[],
        }
    }
}

/// A single vantage-point tree over a training set it does not own.
///
/// Nodes live in a flat arena; dropping the tree releases all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<F: Scalar> {
    nodes: Vec<Node<F>>,
}

impl<F: Scalar> Tree<F> {
    pub fn root(&self) -> &Node<F> {
        &self.nodes[0]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<F>> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0, 0)];
        while let Some((id, d)) = stack.pop() {
            max_depth = max_depth.max(d);
            if let Node::Internal { left, right, .. } = self.nodes[id] {
                stack.push((left, d + 1));
                stack.push((right, d + 1));
            }
        }
        max_depth
    }

    /// Follow the single path chosen by `query` and return the node where
    /// it ends.
    ///
    /// At each internal node the query goes left when its distance to the
    /// vantage point is strictly below the median, right otherwise. If the
    /// chosen child is missing from the arena the current node is returned.
    ///
    /// `query` must have the same dimension as `items`.
    pub(crate) fn descend<T: MetricItem<F>>(&self, items: &[T], query: &T) -> NodeId {
        let mut current = 0;
        loop {
            match self.nodes[current] {
                Node::Leaf { .. } => return current,
                Node::Internal { vantage, median, left, right } => {
                    let d = query.distance(&items[vantage]);
                    let next = if d < median { left } else { right };
                    if next >= self.nodes.len() {
                        return current;
                    }
                    current = next;
                }
            }
        }
    }

    /// The leaf bucket reached by `query`.
    pub(crate) fn search<T: MetricItem<F>>(&self, items: &[T], query: &T) -> &[BucketEntry<F>] {
        self.nodes[self.descend(items, query)].bucket()
    }
}

/// Builds vantage-point trees with a fixed leaf size threshold.
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder {
    min_size: usize,
}

impl TreeBuilder {
    pub fn new(min_size: usize) -> Result<Self> {
        if min_size == 0 {
            return Err(ForestError::InvalidParameter(
                "min_size must be at least 1".to_string(),
            ));
        }
        Ok(TreeBuilder { min_size: min_size })
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Construct a new tree over `items`, drawing vantage points from `rng`.
    ///
    /// Partitions are processed breadth-first from an explicit worklist, so
    /// a badly skewed split costs memory, not stack.
    pub fn build<F, T, R>(&self, items: &[T], rng: &mut R) -> Tree<F>
    where
        F: Scalar,
        T: MetricItem<F>,
        R: Rng + ?Sized,
    {
        let root_bucket: Vec<BucketEntry<F>> = (0..items.len()).map(BucketEntry::new).collect();

        let mut nodes = vec![Node::Leaf { bucket: Vec::new() }];
        let mut pending = VecDeque::new();
        pending.push_back((0, root_bucket));

        while let Some((id, mut bucket)) = pending.pop_front() {
            if bucket.len() <= self.min_size {
                nodes[id] = Node::Leaf { bucket: bucket };
                continue;
            }

            assert!(!bucket.is_empty(), "vantage point requested from an empty partition");
            let vantage = bucket[rng.random_range(0..bucket.len())].index;
            for entry in bucket.iter_mut() {
                entry.distance = items[entry.index].distance(&items[vantage]);
            }

            let mid = bucket.len() / 2;
            quick_select_by(&mut bucket, mid, rng, |a, b| cmp_distance(a.distance, b.distance));
            let median = bucket[mid].distance;
            let right_bucket = bucket.split_off(mid);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { bucket: Vec::new() });
            nodes.push(Node::Leaf { bucket: Vec::new() });
            nodes[id] = Node::Internal { vantage, median, left, right };

            pending.push_back((left, bucket));
            pending.push_back((right, right_bucket));
        }

        Tree { nodes: nodes }
    }
}
