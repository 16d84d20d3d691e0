//! Approximate nearest-neighbor search over packed binary vectors with a
//! forest of randomized vantage-point trees.
//!
//! Every tree is descended along a single path per query; the leaf buckets
//! reached in all trees are merged, deduplicated, and reranked by exact
//! Hamming distance.

pub mod aggregate;
pub mod binary;
pub mod error;
pub mod forest;
pub mod median;
pub mod metric;
pub mod rerank;
pub mod search;
pub mod vptree;

pub use binary::BinaryVector;
pub use error::{ForestError, Result, VectorSource};
pub use forest::Forest;
pub use median::quick_select_by;
pub use metric::{MetricItem, Scalar};
pub use rerank::Neighbor;
pub use search::{search, ForestSearchService, QueryResult, SearchConfig};
pub use vptree::{BucketEntry, Node, NodeId, Tree, TreeBuilder};
