//! Transitive closure followed by refinement, with change detection.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use tracing::debug;

use super::refine::{KnownClassifications, RefineCluster};
use super::traits::{AllowSplits, ClusterSplitHandler, Clustering};
use super::transitive::TransitiveClosure;
use super::types::{Cluster, ClusterIdGenerator, IdExtractor};
use crate::classify::ClassifiedCandidate;
use crate::error::Result;

/// Clusters duplicates transitively, then splits incoherent clusters.
///
/// Remembers the cluster id each record was last reported under. A call
/// returns only the clusters that contain at least one record that is new or
/// whose cluster id changed, each once.
///
/// Change detection compares cluster ids, so what counts as a change depends on
/// the id generator. With [`ids::content_hash`](super::ids::content_hash) an id
/// is a function of the member set, and a cluster is reported exactly when its
/// membership differs from what was last reported. Counter generators such as
/// [`ids::sequential`](super::ids::sequential) mint a fresh id every time a
/// touched cluster is split again, so split groups are re-reported even when
/// their members did not change.
pub struct RefinedTransitiveClosure<C, T, I> {
    refine: RefineCluster<C, T, I>,
    closure: TransitiveClosure<C, T, I>,
    old_cluster_index: HashMap<I, C>,
    id_extractor: IdExtractor<T, I>,
    split_handler: Box<dyn ClusterSplitHandler<C, T>>,
}

impl<C, T, I> RefinedTransitiveClosure<C, T, I>
where
    C: Clone + Ord + 'static,
    T: Clone + 'static,
    I: Clone + Eq + Hash,
{
    /// Build on top of a refiner, sharing its id extractor and id generator.
    pub fn new(refine: RefineCluster<C, T, I>) -> Self {
        let id_extractor = refine.id_extractor();
        let closure = TransitiveClosure::new(refine.id_extractor(), refine.cluster_id_generator());
        Self {
            refine,
            closure,
            old_cluster_index: HashMap::new(),
            id_extractor,
            split_handler: Box::new(AllowSplits),
        }
    }

    /// Consult `handler` before splitting clusters that were already reported.
    pub fn with_split_handler<H>(mut self, handler: H) -> Self
    where
        H: ClusterSplitHandler<C, T> + 'static,
    {
        self.split_handler = Box::new(handler);
        self
    }

    /// The underlying transitive closure.
    pub fn closure(&self) -> &TransitiveClosure<C, T, I> {
        &self.closure
    }

    /// Cluster id the record was last reported under.
    pub fn last_cluster_id(&self, id: &I) -> Option<&C> {
        self.old_cluster_index.get(id)
    }

    fn was_reported(&self, cluster: &Cluster<C, T>) -> bool {
        cluster
            .iter()
            .any(|e| self.old_cluster_index.contains_key(&(self.id_extractor)(e)))
    }
}

impl<C, T, I> Clustering<C, T, I> for RefinedTransitiveClosure<C, T, I>
where
    C: Clone + Ord + 'static,
    T: Clone + 'static,
    I: Clone + Eq + Hash,
{
    fn cluster(&mut self, classified: &[ClassifiedCandidate<T>]) -> Result<Vec<Cluster<C, T>>> {
        let closed = self.closure.cluster(classified)?;
        let known = KnownClassifications::new(classified, &self.id_extractor);

        let mut refined = Vec::with_capacity(closed.len());
        for cluster in closed {
            let parts = self.refine.refine_cluster(cluster.clone(), &known)?;
            if parts.len() > 1
                && self.was_reported(&cluster)
                && !self.split_handler.cluster_split(&cluster, &parts)
            {
                debug!(size = cluster.len(), parts = parts.len(), "split vetoed");
                refined.push(cluster);
            } else {
                refined.extend(parts);
            }
        }

        let mut changed = Vec::new();
        let mut seen = BTreeSet::new();
        for cluster in refined {
            let mut is_changed = false;
            for element in &cluster {
                let id = (self.id_extractor)(element);
                let previous = self.old_cluster_index.insert(id, cluster.id().clone());
                if previous.as_ref() != Some(cluster.id()) {
                    is_changed = true;
                }
            }
            if is_changed && seen.insert(cluster.id().clone()) {
                changed.push(cluster);
            }
        }
        Ok(changed)
    }

    fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C> {
        self.closure.cluster_id_generator()
    }
}
