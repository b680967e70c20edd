//! Stability wrapper: records once reported together stay together.
//!
//! The wrapped clustering may revise earlier decisions, for example when
//! refinement splits a cluster after new evidence arrives. Downstream
//! consumers often cannot follow such splits, so this wrapper re-merges
//! everything a call returns through its own [`TransitiveClosure`] whenever
//! any returned record has been reported before.

use std::hash::Hash;

use tracing::debug;

use super::traits::Clustering;
use super::transitive::TransitiveClosure;
use super::types::{Cluster, ClusterIdGenerator, IdExtractor};
use crate::classify::{Candidate, ClassifiedCandidate};
use crate::error::{Error, Result};

/// Wraps a clustering so that it never splits previously merged records.
pub struct ConsistentClustering<C, T, I, K> {
    clustering: K,
    id_extractor: IdExtractor<T, I>,
    internal: TransitiveClosure<C, T, I>,
}

impl<C, T, I, K> ConsistentClustering<C, T, I, K>
where
    C: Clone + Ord,
    T: Clone,
    I: Clone + Eq + Hash,
    K: Clustering<C, T, I>,
{
    /// Wrap `clustering`. Re-merged clusters get ids from its generator.
    pub fn new(clustering: K, id_extractor: IdExtractor<T, I>) -> Self {
        let internal = TransitiveClosure::new(id_extractor.clone(), clustering.cluster_id_generator());
        Self {
            clustering,
            id_extractor,
            internal,
        }
    }

    /// The wrapped clustering.
    pub fn inner(&self) -> &K {
        &self.clustering
    }

    /// Mutable access to the wrapped clustering.
    pub fn inner_mut(&mut self) -> &mut K {
        &mut self.clustering
    }

    /// Consume the wrapper, returning the wrapped clustering.
    pub fn into_inner(self) -> K {
        self.clustering
    }

    fn untracked(&self, clusters: &[Cluster<C, T>]) -> bool {
        clusters
            .iter()
            .flat_map(Cluster::iter)
            .all(|record| !self.internal.is_tracked(&(self.id_extractor)(record)))
    }
}

impl<C, T, I, K> Clustering<C, T, I> for ConsistentClustering<C, T, I, K>
where
    C: Clone + Ord,
    T: Clone,
    I: Clone + Eq + Hash,
    K: Clustering<C, T, I>,
{
    fn cluster(&mut self, classified: &[ClassifiedCandidate<T>]) -> Result<Vec<Cluster<C, T>>> {
        let clusters = self.clustering.cluster(classified)?;
        if clusters.is_empty() || (clusters.len() == 1 && self.untracked(&clusters)) {
            return Ok(clusters);
        }

        // Every returned record is linked to the first one, so the internal
        // closure folds all of them into one cluster.
        let Some(first) = clusters.first().and_then(|c| c.get(0)).cloned() else {
            return Ok(clusters);
        };
        let candidates: Vec<Candidate<T>> = clusters
            .iter()
            .flat_map(Cluster::iter)
            .map(|record| Candidate::new(first.clone(), record.clone()))
            .collect();
        let merged = self.internal.cluster_duplicates(&candidates);

        match merged.len() {
            0 => return Ok(clusters),
            1 => {}
            found => return Err(Error::MergeMismatch { expected: 1, found }),
        }
        if clusters.len() > 1 {
            debug!(clusters = clusters.len(), size = merged[0].len(), "re-merged split clusters");
        }

        if clusters.len() == 1 && clusters[0].same_members(&merged[0], &self.id_extractor) {
            // The wrapped clustering caught up on its own.
            self.internal.remove_cluster(&merged[0])?;
            debug!(size = merged[0].len(), "released consistent cluster");
        }
        Ok(merged)
    }

    fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C> {
        self.clustering.cluster_id_generator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationResult;
    use crate::cluster::ids;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays a fixed script of outputs, one per call.
    struct Scripted {
        outputs: VecDeque<Vec<Vec<u32>>>,
        id_generator: ClusterIdGenerator<u32, u64>,
    }

    impl Scripted {
        fn new(outputs: Vec<Vec<Vec<u32>>>) -> Self {
            Self {
                outputs: outputs.into(),
                id_generator: ids::sequential(),
            }
        }
    }

    impl Clustering<u64, u32, u32> for Scripted {
        fn cluster(&mut self, _: &[ClassifiedCandidate<u32>]) -> Result<Vec<Cluster<u64, u32>>> {
            let groups = self.outputs.pop_front().unwrap_or_default();
            Ok(groups
                .into_iter()
                .map(|members| Cluster::new((self.id_generator)(&members), members))
                .collect())
        }

        fn cluster_id_generator(&self) -> ClusterIdGenerator<u32, u64> {
            Arc::clone(&self.id_generator)
        }
    }

    fn consistent(outputs: Vec<Vec<Vec<u32>>>) -> ConsistentClustering<u64, u32, u32, Scripted> {
        ConsistentClustering::new(Scripted::new(outputs), Arc::new(|r: &u32| *r))
    }

    fn batch() -> Vec<ClassifiedCandidate<u32>> {
        vec![ClassifiedCandidate::of(0, 0, ClassificationResult::unknown())]
    }

    fn sorted(cluster: &Cluster<u64, u32>) -> Vec<u32> {
        let mut m = cluster.elements().to_vec();
        m.sort();
        m
    }

    #[test]
    fn single_fresh_cluster_passes_through() {
        let mut cc = consistent(vec![vec![vec![1, 2]]]);
        let out = cc.cluster(&batch()).unwrap();
        assert_eq!(out, vec![Cluster::new(0, vec![1, 2])]);
        assert!(!cc.internal.is_tracked(&1));
    }

    #[test]
    fn empty_output_passes_through() {
        let mut cc = consistent(vec![]);
        assert!(cc.cluster(&batch()).unwrap().is_empty());
    }

    #[test]
    fn split_clusters_are_merged_back() {
        let mut cc = consistent(vec![vec![vec![1, 2], vec![3]], vec![vec![1], vec![2, 3]]]);

        let out = cc.cluster(&batch()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(sorted(&out[0]), vec![1, 2, 3]);

        let out = cc.cluster(&batch()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(sorted(&out[0]), vec![1, 2, 3]);
    }

    #[test]
    fn tracked_records_are_reconciled() {
        let mut cc = consistent(vec![vec![vec![1], vec![2]], vec![vec![1, 4]]]);
        cc.cluster(&batch()).unwrap();

        // 1 is tracked together with 2, so 2 comes along.
        let out = cc.cluster(&batch()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(sorted(&out[0]), vec![1, 2, 4]);
    }

    #[test]
    fn reconverged_cluster_is_released() {
        let mut cc = consistent(vec![vec![vec![1], vec![2]], vec![vec![2, 1]]]);
        cc.cluster(&batch()).unwrap();
        assert!(cc.internal.is_tracked(&1));

        let out = cc.cluster(&batch()).unwrap();
        assert_eq!(sorted(&out[0]), vec![1, 2]);
        assert!(!cc.internal.is_tracked(&1));
        assert!(!cc.internal.is_tracked(&2));
    }

    #[test]
    fn uses_wrapped_id_generator() {
        let mut cc = consistent(vec![vec![vec![1], vec![2]]]);
        let out = cc.cluster(&batch()).unwrap();
        // Ids 0 and 1 went to the wrapped output, 2 to the merge.
        assert_eq!(*out[0].id(), 2);
    }
}
