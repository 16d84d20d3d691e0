//! Build-once, query-many search over packed binary vectors.
//!
//! ```
//! use vpforest::{search, BinaryVector, SearchConfig};
//!
//! let train: Vec<BinaryVector> = (0..64u64).map(|i| BinaryVector::new(vec![i * 0x9e37_79b9])).collect();
//! let queries = vec![train[3].clone()];
//! let config = SearchConfig::default().with_min_size(8).with_num_tree(4).with_seed(1);
//!
//! let results = search(&train, &queries, 5, &config).unwrap();
//! assert!(results[0].returned_count <= 5);
//! assert_eq!(results[0].indices.len(), results[0].distances.len());
//! ```
use std::time::Instant;

use log::{debug, info, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::binary::BinaryVector;
use crate::error::{ForestError, Result, VectorSource};
use crate::forest::Forest;
use crate::metric::Scalar;

pub const DEFAULT_MIN_SIZE: usize = 200;
pub const DEFAULT_NUM_TREE: usize = 10;

/// Forest and query settings.
///
/// Missing fields in a serialized config take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Largest bucket a leaf may hold.
    pub min_size: usize,
    /// Number of trees in the forest.
    pub num_tree: usize,
    /// Seed for vantage point selection; drawn at random when unset.
    pub seed: Option<u64>,
    /// Answer batches of queries on the rayon pool.
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            min_size: DEFAULT_MIN_SIZE,
            num_tree: DEFAULT_NUM_TREE,
            seed: None,
            parallel: true,
        }
    }
}

impl SearchConfig {
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_num_tree(mut self, num_tree: usize) -> Self {
        self.num_tree = num_tree;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(ForestError::InvalidParameter(
                "min_size must be at least 1".to_string(),
            ));
        }
        if self.num_tree == 0 {
            return Err(ForestError::InvalidParameter(
                "num_tree must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The answer to one query.
///
/// `indices` and `distances` both hold `returned_count` entries, nearest
/// first. `candidates_found` is the number of distinct training samples
/// the forest proposed; `returned_count` is `min(knn, candidates_found)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<F: Scalar> {
    pub indices: Vec<usize>,
    pub distances: Vec<F>,
    pub returned_count: usize,
    pub candidates_found: usize,
}

impl<F: Scalar> QueryResult<F> {
    pub fn empty() -> Self {
        QueryResult {
            indices: Vec::new(),
            distances: Vec::new(),
            returned_count: 0,
            candidates_found: 0,
        }
    }
}

/// A forest built over a borrowed training set, ready to answer queries.
pub struct ForestSearchService<'a> {
    forest: Forest<'a, f32, BinaryVector>,
    feat_dim: Option<usize>,
    config: SearchConfig,
    seed: u64,
}

fn check_dims(vectors: &[BinaryVector], expected: usize, set: VectorSource) -> Result<()> {
    match vectors.iter().position(|v| v.feat_dim() != expected) {
        Some(index) => Err(ForestError::DimensionMismatch {
            set: set,
            index: index,
            expected: expected,
            got: vectors[index].feat_dim(),
        }),
        None => Ok(()),
    }
}

fn check_knn(knn: usize) -> Result<()> {
    if knn == 0 {
        return Err(ForestError::InvalidParameter("knn must be at least 1".to_string()));
    }
    Ok(())
}

impl<'a> ForestSearchService<'a> {
    /// Validate `train` and build the forest described by `config`.
    pub fn build(train: &'a [BinaryVector], config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let feat_dim = train.first().map(|v| v.feat_dim());
        if let Some(dim) = feat_dim {
            check_dims(train, dim, VectorSource::Training)?;
        }

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random();
                debug!("no seed configured, using {}", seed);
                seed
            }
        };

        let forest = Forest::build(train, config.num_tree, config.min_size, seed)?;
        Ok(ForestSearchService { forest: forest, feat_dim: feat_dim, config: config, seed: seed })
    }

    pub fn forest(&self) -> &Forest<'a, f32, BinaryVector> {
        &self.forest
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The seed the forest was actually built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Word count of the training vectors, `None` for an empty training set.
    pub fn feat_dim(&self) -> Option<usize> {
        self.feat_dim
    }

    fn answer(&self, query: &BinaryVector, knn: usize) -> QueryResult<f32> {
        if self.forest.items().is_empty() {
            return QueryResult::empty();
        }
        let (neighbors, found) = self.forest.nearest_neighbors(query, knn);
        trace!("{} candidates, returning {}", found, neighbors.len());
        QueryResult {
            indices: neighbors.iter().map(|n| n.index).collect(),
            distances: neighbors.iter().map(|n| n.distance).collect(),
            returned_count: neighbors.len(),
            candidates_found: found,
        }
    }

    /// Approximate `knn` nearest training vectors of `query`.
    pub fn query(&self, query: &BinaryVector, knn: usize) -> Result<QueryResult<f32>> {
        check_knn(knn)?;
        if let Some(dim) = self.feat_dim {
            check_dims(std::slice::from_ref(query), dim, VectorSource::Query)?;
        }
        Ok(self.answer(query, knn))
    }

    /// Answer every query independently; results are in query order.
    ///
    /// All queries are checked against the training dimension before any
    /// of them is searched.
    pub fn query_batch(&self, queries: &[BinaryVector], knn: usize) -> Result<Vec<QueryResult<f32>>> {
        check_knn(knn)?;
        if let Some(dim) = self.feat_dim {
            check_dims(queries, dim, VectorSource::Query)?;
        }

        let start = Instant::now();
        let results: Vec<QueryResult<f32>> = if self.config.parallel {
            queries.par_iter().map(|q| self.answer(q, knn)).collect()
        } else {
            queries.iter().map(|q| self.answer(q, knn)).collect()
        };
        info!(
            "searched {} queries in {:.4} msecs",
            queries.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(results)
    }
}

/// Build a forest over `train` and answer every query in `queries`.
///
/// Training and query vectors must all have the same word count; a
/// mismatch is reported before any tree is built.
pub fn search(
    train: &[BinaryVector],
    queries: &[BinaryVector],
    knn: usize,
    config: &SearchConfig,
) -> Result<Vec<QueryResult<f32>>> {
    check_knn(knn)?;
    if let Some(first) = train.first() {
        check_dims(queries, first.feat_dim(), VectorSource::Query)?;
    }
    let service = ForestSearchService::build(train, config.clone())?;
    service.query_batch(queries, knn)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(n: u64) -> Vec<BinaryVector> {
        (0..n)
            .map(|i| BinaryVector::new(vec![i.wrapping_mul(0x9e37_79b9_7f4a_7c15), i]))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let c = SearchConfig::default();
        assert_eq!(c.min_size, 200);
        assert_eq!(c.num_tree, 10);
        assert_eq!(c.seed, None);
        assert!(c.parallel);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let c: SearchConfig = serde_json::from_str(r#"{"num_tree": 3, "seed": 12}"#).unwrap();
        assert_eq!(c, SearchConfig::default().with_num_tree(3).with_seed(12));

        let back: SearchConfig = serde_json::from_str(&serde_json::to_string(&c).unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_invalid_config() {
        assert!(SearchConfig::default().with_min_size(0).validate().is_err());
        assert!(SearchConfig::default().with_num_tree(0).validate().is_err());
        let train = codes(10);
        assert!(ForestSearchService::build(&train, SearchConfig::default().with_num_tree(0)).is_err());
    }

    #[test]
    fn test_training_dimension_mismatch() {
        let mut train = codes(5);
        train.push(BinaryVector::zeros(3));
        let err = ForestSearchService::build(&train, SearchConfig::default()).err().unwrap();
        assert_eq!(
            err,
            ForestError::DimensionMismatch {
                set: VectorSource::Training,
                index: 5,
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let train = codes(20);
        let queries = vec![BinaryVector::zeros(2), BinaryVector::zeros(1)];
        let err = search(&train, &queries, 3, &SearchConfig::default()).unwrap_err();
        match err {
            ForestError::DimensionMismatch { set, index, .. } => {
                assert_eq!(set, VectorSource::Query);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let service = ForestSearchService::build(&train, SearchConfig::default()).unwrap();
        assert!(service.query(&BinaryVector::zeros(4), 1).is_err());
    }

    #[test]
    fn test_wider_query_is_rejected() {
        let train: Vec<BinaryVector> = (0..50u64).map(|i| BinaryVector::new(vec![i])).collect();
        let config = SearchConfig::default().with_min_size(4).with_seed(3);
        let service = ForestSearchService::build(&train, config).unwrap();
        let err = service.query(&BinaryVector::new(vec![3, u64::MAX]), 1).unwrap_err();
        assert_eq!(
            err,
            ForestError::DimensionMismatch {
                set: VectorSource::Query,
                index: 0,
                expected: 1,
                got: 2,
            }
        );
    }

    #[test]
    fn test_zero_knn_rejected() {
        let train = codes(20);
        assert!(search(&train, &train, 0, &SearchConfig::default()).is_err());
    }

    #[test]
    fn test_empty_training_set() {
        let train: Vec<BinaryVector> = Vec::new();
        let queries = codes(3);
        let results = search(&train, &queries, 4, &SearchConfig::default()).unwrap();
        assert_eq!(results.len(), 3);
        for r in results {
            assert_eq!(r, QueryResult::empty());
        }
    }

    #[test]
    fn test_seed_is_recorded() {
        let train = codes(50);
        let a = ForestSearchService::build(&train, SearchConfig::default().with_min_size(4)).unwrap();
        let b = ForestSearchService::build(
            &train,
            SearchConfig::default().with_min_size(4).with_seed(a.seed()),
        )
        .unwrap();
        assert_eq!(a.forest().trees(), b.forest().trees());
        assert_eq!(a.feat_dim(), Some(2));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let train = codes(500);
        let queries = codes(40);
        let config = SearchConfig::default().with_min_size(16).with_num_tree(5).with_seed(3);
        let par = search(&train, &queries, 7, &config).unwrap();
        let seq = search(&train, &queries, 7, &config.clone().with_parallel(false)).unwrap();
        assert_eq!(par, seq);
    }
}
