use thiserror::Error;

/// Boxed error produced by an external collaborator such as a classifier.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the clustering engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A cluster with no elements was handed to refinement.
    #[error("cannot refine an empty cluster")]
    EmptyCluster,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// The cluster passed to `remove_cluster` is not tracked as one coherent group.
    #[error("cluster is not tracked by the index as a single group")]
    UnknownCluster,

    /// More edges were requested than there are distinct pairs.
    #[error("edge sampling reached {reached} of {desired} edges")]
    InsufficientEdges {
        /// Requested number of edges.
        desired: usize,
        /// Number of edges that could be produced.
        reached: usize,
    },

    /// Exhaustive search found no partition for a non-empty cluster.
    #[error("no partition found for a cluster of {size} elements")]
    NoPartition {
        /// Cluster size.
        size: usize,
    },

    /// An edge reached greedy clustering without a weight.
    #[error("edge ({left}, {right}) has no weight")]
    UnscoredEdge {
        /// Smaller endpoint.
        left: usize,
        /// Larger endpoint.
        right: usize,
    },

    /// An edge endpoint does not address an element of the cluster.
    #[error("edge endpoint {index} out of bounds for {size} elements")]
    EdgeOutOfBounds {
        /// Offending endpoint.
        index: usize,
        /// Number of elements.
        size: usize,
    },

    /// Forced re-merging produced an unexpected number of clusters.
    #[error("expected {expected} merged cluster(s), found {found}")]
    MergeMismatch {
        /// Expected cluster count.
        expected: usize,
        /// Actual cluster count.
        found: usize,
    },

    /// The injected classifier failed.
    #[error("classifier failed: {0}")]
    Classifier(#[source] BoxError),
}

impl Error {
    /// Wrap a classifier failure.
    pub fn classifier(err: impl Into<BoxError>) -> Self {
        Self::Classifier(err.into())
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
