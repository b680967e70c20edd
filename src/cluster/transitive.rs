//! Online transitive closure over duplicate judgments.
//!
//! Records are indexed by id to the cluster currently holding them. Clusters
//! live in an arena keyed by [`ClusterHandle`], so "are these two records
//! already together" is a handle comparison rather than a structural one.
//!
//! Per duplicate pair `(r1, r2)`:
//!
//! | r1 indexed | r2 indexed | effect                                          |
//! |------------|------------|-------------------------------------------------|
//! | no         | no         | new cluster `[r1, r2]` with a fresh id          |
//! | same       | same       | nothing; the cluster is reported as touched     |
//! | yes        | no         | `r2` appended to r1's cluster (id unchanged)    |
//! | no         | yes        | `r1` appended to r2's cluster (id unchanged)    |
//! | yes        | yes        | both merged into a new cluster with a fresh id  |
//!
//! Appends and no-ops cost a hash lookup. A merge costs time linear in the
//! size of the merged cluster: every member is re-indexed to the new handle and
//! the id generator is handed the full list of member ids.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, trace};

use super::traits::Clustering;
use super::types::{Cluster, ClusterIdGenerator, IdExtractor};
use crate::classify::{Candidate, ClassifiedCandidate};
use crate::error::{Error, Result};

/// Arena slot of a live cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterHandle(u64);

/// Incremental clustering by transitive closure of duplicate pairs.
pub struct TransitiveClosure<C, T, I> {
    id_extractor: IdExtractor<T, I>,
    id_generator: ClusterIdGenerator<I, C>,
    clusters: HashMap<ClusterHandle, Cluster<C, T>>,
    index: HashMap<I, ClusterHandle>,
    next_handle: u64,
}

impl<C, T, I> TransitiveClosure<C, T, I>
where
    C: Clone + Ord,
    T: Clone,
    I: Clone + Eq + Hash,
{
    /// Create an empty closure.
    pub fn new(id_extractor: IdExtractor<T, I>, id_generator: ClusterIdGenerator<I, C>) -> Self {
        Self {
            id_extractor,
            id_generator,
            clusters: HashMap::new(),
            index: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Fold duplicate pairs into the index.
    ///
    /// Returns the live clusters touched by this call, once each, in order of
    /// first touch. A cluster that was merged away later in the same call is
    /// represented by the cluster it was merged into.
    pub fn cluster_duplicates<'a, D>(&mut self, duplicates: D) -> Vec<Cluster<C, T>>
    where
        D: IntoIterator<Item = &'a Candidate<T>>,
        T: 'a,
    {
        let mut touched: Vec<ClusterHandle> = Vec::new();

        for candidate in duplicates {
            let left_id = (self.id_extractor)(&candidate.record1);
            let right_id = (self.id_extractor)(&candidate.record2);
            let left = self.index.get(&left_id).copied();
            let right = self.index.get(&right_id).copied();

            let handle = match (left, right) {
                (None, None) if left_id == right_id => {
                    trace!("ignoring self pair of an untracked record");
                    continue;
                }
                (None, None) => {
                    let id = (self.id_generator)(&[left_id.clone(), right_id.clone()]);
                    let cluster = Cluster::new(
                        id,
                        vec![candidate.record1.clone(), candidate.record2.clone()],
                    );
                    let handle = self.insert(cluster);
                    self.index.insert(left_id, handle);
                    self.index.insert(right_id, handle);
                    trace!("created cluster");
                    handle
                }
                (Some(l), Some(r)) if l == r => l,
                (Some(handle), None) => self.append(handle, right_id, &candidate.record2),
                (None, Some(handle)) => self.append(handle, left_id, &candidate.record1),
                (Some(l), Some(r)) => self.merge(l, r),
            };
            touched.push(handle);
        }

        let mut reported = HashSet::new();
        let mut ids = BTreeSet::new();
        touched
            .into_iter()
            .filter(|handle| reported.insert(*handle))
            .filter_map(|handle| self.clusters.get(&handle))
            .filter(|cluster| ids.insert(cluster.id().clone()))
            .cloned()
            .collect()
    }

    fn insert(&mut self, cluster: Cluster<C, T>) -> ClusterHandle {
        let handle = ClusterHandle(self.next_handle);
        self.next_handle += 1;
        self.clusters.insert(handle, cluster);
        handle
    }

    fn append(&mut self, handle: ClusterHandle, id: I, record: &T) -> ClusterHandle {
        if let Some(cluster) = self.clusters.get_mut(&handle) {
            cluster.push(record.clone());
        }
        self.index.insert(id, handle);
        handle
    }

    fn merge(&mut self, left: ClusterHandle, right: ClusterHandle) -> ClusterHandle {
        let mut elements = self
            .clusters
            .remove(&left)
            .map(Cluster::into_elements)
            .unwrap_or_default();
        if let Some(other) = self.clusters.remove(&right) {
            elements.extend(other.into_elements());
        }

        let ids: Vec<I> = elements.iter().map(|e| (self.id_extractor)(e)).collect();
        let merged = Cluster::new((self.id_generator)(&ids), elements);
        debug!(size = merged.len(), "merged clusters");

        let handle = self.insert(merged);
        for id in ids {
            self.index.insert(id, handle);
        }
        handle
    }

    /// Stop tracking a cluster.
    ///
    /// Every member of `cluster` must currently resolve to one and the same
    /// tracked cluster, which must have the same id and member set. Otherwise
    /// the cluster has been superseded and [`Error::UnknownCluster`] is returned.
    pub fn remove_cluster(&mut self, cluster: &Cluster<C, T>) -> Result<()> {
        let ids = cluster.member_ids(&self.id_extractor);
        let mut handle: Option<ClusterHandle> = None;
        for id in &ids {
            match (self.index.get(id), handle) {
                (None, _) => return Err(Error::UnknownCluster),
                (Some(&h), None) => handle = Some(h),
                (Some(&h), Some(prev)) if h != prev => return Err(Error::UnknownCluster),
                _ => {}
            }
        }
        let handle = handle.ok_or(Error::UnknownCluster)?;

        let tracked = self.clusters.get(&handle).ok_or(Error::UnknownCluster)?;
        if tracked.id() != cluster.id() || !tracked.same_members(cluster, &self.id_extractor) {
            return Err(Error::UnknownCluster);
        }

        if let Some(removed) = self.clusters.remove(&handle) {
            for id in removed.member_ids(&self.id_extractor) {
                self.index.remove(&id);
            }
        }
        debug!(size = ids.len(), "removed cluster");
        Ok(())
    }

    /// The cluster currently holding the record with this id.
    pub fn cluster_of(&self, id: &I) -> Option<&Cluster<C, T>> {
        self.index.get(id).and_then(|h| self.clusters.get(h))
    }

    /// True if the record with this id belongs to a tracked cluster.
    pub fn is_tracked(&self, id: &I) -> bool {
        self.index.contains_key(id)
    }

    /// Number of live clusters.
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// All live clusters, in no particular order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster<C, T>> {
        self.clusters.values()
    }

    /// The record id extractor.
    pub fn id_extractor(&self) -> IdExtractor<T, I> {
        Arc::clone(&self.id_extractor)
    }
}

impl<C, T, I> Clustering<C, T, I> for TransitiveClosure<C, T, I>
where
    C: Clone + Ord,
    T: Clone,
    I: Clone + Eq + Hash,
{
    /// Only duplicate judgments link records; everything else is ignored.
    fn cluster(&mut self, classified: &[ClassifiedCandidate<T>]) -> Result<Vec<Cluster<C, T>>> {
        let duplicates = classified
            .iter()
            .filter(|c| c.is_duplicate())
            .map(|c| &c.candidate);
        Ok(self.cluster_duplicates(duplicates))
    }

    fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C> {
        Arc::clone(&self.id_generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationResult;
    use crate::cluster::ids;

    fn closure() -> TransitiveClosure<u64, u32, u32> {
        TransitiveClosure::new(Arc::new(|r: &u32| *r), ids::sequential())
    }

    fn pairs(raw: &[(u32, u32)]) -> Vec<Candidate<u32>> {
        raw.iter().map(|&(a, b)| Candidate::new(a, b)).collect()
    }

    fn sorted(cluster: &Cluster<u64, u32>) -> Vec<u32> {
        let mut m = cluster.elements().to_vec();
        m.sort();
        m
    }

    #[test]
    fn creates_appends_and_merges() {
        let mut tc = closure();

        let out = tc.cluster_duplicates(&pairs(&[(1, 2)]));
        assert_eq!(out, vec![Cluster::new(0, vec![1, 2])]);

        let out = tc.cluster_duplicates(&pairs(&[(2, 3)]));
        assert_eq!(out, vec![Cluster::new(0, vec![1, 2, 3])]);

        let out = tc.cluster_duplicates(&pairs(&[(4, 5), (5, 1)]));
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].id(), 2);
        assert_eq!(sorted(&out[0]), vec![1, 2, 3, 4, 5]);
        assert_eq!(tc.num_clusters(), 1);
    }

    #[test]
    fn reconfirmed_pair_is_touched_but_unchanged() {
        let mut tc = closure();
        let first = tc.cluster_duplicates(&pairs(&[(1, 2)]));
        let second = tc.cluster_duplicates(&pairs(&[(2, 1)]));
        assert_eq!(first, second);
    }

    #[test]
    fn reports_each_live_cluster_once() {
        let mut tc = closure();
        let out = tc.cluster_duplicates(&pairs(&[(1, 2), (3, 4), (1, 2), (5, 6)]));
        assert_eq!(out.len(), 3);

        let out = tc.cluster_duplicates(&pairs(&[(1, 7), (2, 3)]));
        assert_eq!(out.len(), 1);
        assert_eq!(sorted(&out[0]), vec![1, 2, 3, 4, 7]);
    }

    #[test]
    fn self_pairs_of_unknown_records_are_ignored() {
        let mut tc = closure();
        assert!(tc.cluster_duplicates(&pairs(&[(1, 1)])).is_empty());
        assert!(!tc.is_tracked(&1));
    }

    #[test]
    fn cluster_ignores_non_duplicates() {
        let mut tc = closure();
        let classified = vec![
            ClassifiedCandidate::of(1, 2, ClassificationResult::non_duplicate(0.9)),
            ClassifiedCandidate::of(3, 4, ClassificationResult::duplicate(0.9)),
            ClassifiedCandidate::of(4, 5, ClassificationResult::unknown()),
        ];
        let out = tc.cluster(&classified).unwrap();
        assert_eq!(out, vec![Cluster::new(0, vec![3, 4])]);
        assert!(!tc.is_tracked(&1));
    }

    #[test]
    fn merged_id_covers_every_member() {
        let mut tc: TransitiveClosure<u64, u32, u32> =
            TransitiveClosure::new(Arc::new(|r: &u32| *r), ids::content_hash());
        tc.cluster_duplicates(&pairs(&[(1, 2), (3, 4), (4, 5)]));

        let out = tc.cluster_duplicates(&pairs(&[(2, 5)]));
        assert_eq!(out.len(), 1);
        assert_eq!(*out[0].id(), ids::content_hash()(&[5, 4, 3, 2, 1]));
        for id in 1..=5 {
            assert_eq!(tc.cluster_of(&id), Some(&out[0]));
        }
    }

    #[test]
    fn remove_cluster_checks_identity() {
        let mut tc = closure();
        let c = tc.cluster_duplicates(&pairs(&[(1, 2)])).remove(0);
        tc.cluster_duplicates(&pairs(&[(3, 4)]));

        // Wrong id, mixed groups, unknown members.
        assert!(tc.remove_cluster(&Cluster::new(9, vec![1, 2])).is_err());
        assert!(tc.remove_cluster(&Cluster::new(0, vec![1, 3])).is_err());
        assert!(tc.remove_cluster(&Cluster::new(0, vec![1, 8])).is_err());
        assert!(tc.remove_cluster(&Cluster::new(0, vec![1])).is_err());

        tc.remove_cluster(&c).unwrap();
        assert!(!tc.is_tracked(&1));
        assert!(tc.cluster_of(&3).is_some());
        assert_eq!(tc.num_clusters(), 1);

        // Superseded after a merge.
        let old = tc.cluster_of(&3).cloned().unwrap();
        tc.cluster_duplicates(&pairs(&[(4, 5), (5, 6), (6, 3)]));
        assert!(tc.remove_cluster(&old).is_err());
    }
}
