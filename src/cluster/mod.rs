//! Clustering of duplicate judgments into groups of records.
//!
//! This module turns pairwise duplicate decisions into clusters and keeps
//! those clusters coherent as new batches of decisions arrive.
//!
//! ## Transitive closure vs refinement
//!
//! **Transitive closure** treats every duplicate judgment as a link: a
//! duplicate of a duplicate is in the same cluster. It is cheap and online,
//! but a single false positive glues two unrelated groups together.
//!
//! **Refinement** looks inside each cluster and asks whether its members are
//! actually mutual duplicates. It scores every way of splitting the cluster
//! and keeps the best one.
//!
//! ## Algorithms (implemented)
//!
//! ### Transitive closure
//!
//! Incremental union of duplicate pairs with a record-id index. See
//! [`TransitiveClosure`].
//!
//! ### Refinement
//!
//! **Objective**: for a partition `p` of `n` members and pair weights
//! `w(i, j)` (positive for duplicates, negative for non-duplicates):
//!
//! ```text
//! score = Σ_{p(i) = p(j)} w(i,j) / |p(i)|
//!       - Σ_{p(i) ≠ p(j)} w(i,j) / (n - |p(i)|) + w(i,j) / (n - |p(j)|)
//! ```
//!
//! - **Exact** (`n ≤ max_small_cluster_size`): enumerate all Bell(n) set
//!   partitions, classifying pairs lazily.
//! - **Heuristic** (larger clusters): sample `T(max_small_cluster_size)`
//!   edges, then merge greedily along the strongest edges while the score
//!   improves.
//!
//! See [`RefineCluster`] and [`RefinedTransitiveClosure`].
//!
//! ### Consistency
//!
//! [`ConsistentClustering`] wraps any [`Clustering`] and re-merges whatever it
//! splits apart, so records reported together stay together.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dedupe::classify::{ClassificationResult, ClassifiedCandidate};
//! use dedupe::cluster::{ids, Clustering, RefineCluster, RefinedTransitiveClosure};
//!
//! type Person = (u32, &'static str);
//!
//! let same_name = |a: &Person, b: &Person| -> dedupe::Result<ClassificationResult> {
//!     Ok(if a.1 == b.1 {
//!         ClassificationResult::duplicate(1.0)
//!     } else {
//!         ClassificationResult::non_duplicate(1.0)
//!     })
//! };
//!
//! let refine = RefineCluster::new(same_name, Arc::new(|p: &Person| p.0), ids::sequential())
//!     .with_seed(7);
//! let mut clustering = RefinedTransitiveClosure::new(refine);
//!
//! // A wrong link between 2 and 3 chains all four records together.
//! let judged = [((1, "ann"), (2, "ann")), ((3, "bob"), (4, "bob")), ((2, "ann"), (3, "bob"))]
//!     .into_iter()
//!     .map(|(a, b)| ClassifiedCandidate::of(a, b, ClassificationResult::duplicate(0.9)))
//!     .collect::<Vec<_>>();
//!
//! let clusters = clustering.cluster(&judged).unwrap();
//! assert_eq!(clusters.len(), 2);
//! ```

mod consistent;
mod edge;
mod greedy;
pub mod ids;
mod oracle;
mod partition;
mod refine;
mod refined;
mod traits;
mod transitive;
mod types;
mod util;

pub use consistent::ConsistentClustering;
pub use edge::{expand_by_triangles, random_edges, EdgeWeight, WeightMatrix, WeightedEdge};
pub use greedy::GreedyClustering;
pub use oracle::OracleClustering;
pub use partition::{best_partition, score_partition, SetPartitions};
pub use refine::{RefineCluster, RefineConfig};
pub use refined::RefinedTransitiveClosure;
pub use traits::{AllowSplits, ClusterSplitHandler, Clustering};
pub use transitive::{ClusterHandle, TransitiveClosure};
pub use types::{Cluster, ClusterIdGenerator, IdExtractor};
pub use util::{gauss_pair, num_pairs, pair_index, triangular_number};
