use super::types::{Cluster, ClusterIdGenerator};
use crate::classify::ClassifiedCandidate;
use crate::error::Result;

/// Common interface for clusterings driven by classified candidate pairs.
///
/// Implementations are long-lived and stateful: each call folds a new batch of
/// judgments into the state built by earlier calls and returns the clusters
/// that changed.
pub trait Clustering<C, T, I> {
    /// Fold a batch of classified candidates into the clustering.
    fn cluster(&mut self, classified: &[ClassifiedCandidate<T>]) -> Result<Vec<Cluster<C, T>>>;

    /// The generator used to mint cluster ids, so wrappers can mint compatible ones.
    fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C>;
}

/// Veto callback for splitting a previously emitted cluster.
///
/// Returning `false` asks the caller to keep `main` intact. Honoring the
/// request is up to the clustering that consults the handler.
pub trait ClusterSplitHandler<C, T> {
    /// Called with the cluster about to be split and the parts it would split into.
    fn cluster_split(&self, main: &Cluster<C, T>, parts: &[Cluster<C, T>]) -> bool;
}

impl<C, T, F> ClusterSplitHandler<C, T> for F
where
    F: Fn(&Cluster<C, T>, &[Cluster<C, T>]) -> bool,
{
    fn cluster_split(&self, main: &Cluster<C, T>, parts: &[Cluster<C, T>]) -> bool {
        self(main, parts)
    }
}

/// Split handler that never vetoes.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowSplits;

impl<C, T> ClusterSplitHandler<C, T> for AllowSplits {
    fn cluster_split(&self, _main: &Cluster<C, T>, _parts: &[Cluster<C, T>]) -> bool {
        true
    }
}
