//! A forest of independently randomized vantage-point trees over one
//! training set.
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::aggregate;
use crate::error::{ForestError, Result};
use crate::metric::{MetricItem, Scalar};
use crate::rerank::{self, Neighbor};
use crate::vptree::{BucketEntry, Tree, TreeBuilder};

pub struct Forest<'a, F: Scalar, T: 'a> {
    items: &'a [T],
    trees: Vec<Tree<F>>,
    min_size: usize,
}

impl<'a, F, T> Forest<'a, F, T>
where
    F: Scalar,
    T: MetricItem<F> + Sync,
{
    /// Build `num_tree` trees over `items` in parallel.
    ///
    /// Tree `i` is seeded with the `i`-th value drawn from a generator
    /// seeded with `seed`, so a forest is always a prefix of a larger
    /// forest built with the same seed.
    pub fn build(items: &'a [T], num_tree: usize, min_size: usize, seed: u64) -> Result<Self> {
        if num_tree == 0 {
            return Err(ForestError::InvalidParameter(
                "num_tree must be at least 1".to_string(),
            ));
        }
        let builder = TreeBuilder::new(min_size)?;

        let start = Instant::now();
        let mut master = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..num_tree).map(|_| master.random()).collect();

        let trees: Vec<Tree<F>> = seeds
            .par_iter()
            .enumerate()
            .map(|(i, &tree_seed)| {
                let tree = builder.build(items, &mut StdRng::seed_from_u64(tree_seed));
                debug!(
                    "tree {}: {} nodes, {} leaves, depth {}",
                    i,
                    tree.node_count(),
                    tree.leaf_count(),
                    tree.depth()
                );
                tree
            })
            .collect();

        info!(
            "{} trees with {} nodes each built in {:.4} msecs",
            num_tree,
            trees[0].node_count(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(Forest { items: items, trees: trees, min_size: min_size })
    }

    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn trees(&self) -> &[Tree<F>] {
        &self.trees
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Total nodes across all trees.
    pub fn node_count(&self) -> usize {
        self.trees.iter().map(|t| t.node_count()).sum()
    }

    /// Descend every tree and merge the reached buckets, one entry per
    /// distinct training index.
    ///
    /// `query` must have the training vectors' dimension; callers check it.
    pub(crate) fn candidates(&self, query: &T) -> Vec<BucketEntry<F>> {
        let buckets = self.trees.iter().map(|t| t.search(self.items, query));
        aggregate::collect(buckets)
    }

    /// Approximate k nearest neighbors of `query`, nearest first, together
    /// with the number of distinct candidates they were ranked from.
    ///
    /// Same dimension precondition as `candidates`.
    pub(crate) fn nearest_neighbors(&self, query: &T, knn: usize) -> (Vec<Neighbor<F>>, usize) {
        let candidates = self.candidates(query);
        let found = candidates.len();
        (rerank::rerank(self.items, query, candidates, knn), found)
    }
}
