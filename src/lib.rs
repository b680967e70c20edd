//! Duplicate clustering primitives.
//!
//! `dedupe` turns pairwise duplicate judgments into clusters of records. It is
//! the clustering core of a record-linkage pipeline: candidate selection and
//! the classifier are supplied by the caller.
//!
//! The primary public API is under [`cluster`], which provides:
//! - online transitive closure over duplicate pairs
//! - refinement of incoherent clusters (exact partition search for small
//!   clusters, greedy edge-driven merging for large ones)
//! - a consistency wrapper that never splits records reported together
//!
//! [`pipeline`] glues a [`Classifier`] to a [`Clustering`].

#![forbid(unsafe_code)]

pub mod classify;
pub mod cluster;
pub mod error;
pub mod pipeline;

pub use classify::{
    Candidate, Classification, ClassificationResult, ClassifiedCandidate, Classifier,
};
pub use cluster::{
    Cluster, ClusterIdGenerator, Clustering, ConsistentClustering, IdExtractor, RefineCluster,
    RefineConfig, RefinedTransitiveClosure, TransitiveClosure,
};
pub use error::{Error, Result};
pub use pipeline::{ErrorContext, ErrorPolicy, PairBasedDuplicateDetection};
