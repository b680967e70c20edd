//! Clustering backed by a known gold-standard partition.
//!
//! Useful for evaluating the rest of a pipeline in isolation, and as a
//! deterministic stand-in wherever a [`Clustering`] is expected.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use super::traits::Clustering;
use super::types::{Cluster, ClusterIdGenerator, IdExtractor};
use crate::classify::ClassifiedCandidate;
use crate::error::Result;

/// Answers every candidate with the gold cluster of its second record.
pub struct OracleClustering<C, T, I> {
    gold: Vec<Cluster<C, T>>,
    by_record: HashMap<I, usize>,
    id_extractor: IdExtractor<T, I>,
    id_generator: ClusterIdGenerator<I, C>,
}

impl<C, T, I> OracleClustering<C, T, I>
where
    C: Clone + Send + Sync + 'static,
    T: Clone,
    I: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Build from gold clusters.
    ///
    /// `fallback` mints ids for groups whose first member is not part of any
    /// gold cluster.
    pub fn new(
        gold: Vec<Cluster<C, T>>,
        id_extractor: IdExtractor<T, I>,
        fallback: ClusterIdGenerator<I, C>,
    ) -> Self {
        let mut by_record = HashMap::new();
        let mut gold_ids: HashMap<I, C> = HashMap::new();
        for (pos, cluster) in gold.iter().enumerate() {
            for id in cluster.member_ids(&id_extractor) {
                by_record.entry(id.clone()).or_insert(pos);
                gold_ids.entry(id).or_insert_with(|| cluster.id().clone());
            }
        }

        let id_generator: ClusterIdGenerator<I, C> = Arc::new(move |ids: &[I]| {
            ids.first()
                .and_then(|id| gold_ids.get(id))
                .cloned()
                .unwrap_or_else(|| fallback(ids))
        });

        Self {
            gold,
            by_record,
            id_extractor,
            id_generator,
        }
    }

    /// The gold cluster holding the record with this id.
    pub fn gold_cluster_of(&self, id: &I) -> Option<&Cluster<C, T>> {
        self.by_record.get(id).map(|&pos| &self.gold[pos])
    }
}

impl<C, T, I> Clustering<C, T, I> for OracleClustering<C, T, I>
where
    C: Clone + Send + Sync + 'static,
    T: Clone,
    I: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn cluster(&mut self, classified: &[ClassifiedCandidate<T>]) -> Result<Vec<Cluster<C, T>>> {
        let mut emitted = HashSet::new();
        Ok(classified
            .iter()
            .filter_map(|c| self.by_record.get(&(self.id_extractor)(&c.candidate.record2)))
            .filter(|&&pos| emitted.insert(pos))
            .map(|&pos| self.gold[pos].clone())
            .collect())
    }

    fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C> {
        Arc::clone(&self.id_generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassificationResult;

    fn oracle() -> OracleClustering<String, u32, u32> {
        let gold = vec![
            Cluster::new("a".to_string(), vec![1, 2, 3]),
            Cluster::new("b".to_string(), vec![4, 5]),
        ];
        OracleClustering::new(
            gold,
            Arc::new(|r: &u32| *r),
            Arc::new(|ids: &[u32]| format!("new-{}", ids.len())),
        )
    }

    #[test]
    fn emits_gold_cluster_of_second_record() {
        let mut oracle = oracle();
        let classified = vec![
            ClassifiedCandidate::of(9, 2, ClassificationResult::non_duplicate(1.0)),
            ClassifiedCandidate::of(1, 3, ClassificationResult::duplicate(1.0)),
            ClassifiedCandidate::of(2, 5, ClassificationResult::unknown()),
            ClassifiedCandidate::of(1, 7, ClassificationResult::duplicate(1.0)),
        ];
        let out = oracle.cluster(&classified).unwrap();
        let ids: Vec<&str> = out.iter().map(|c| c.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn generator_prefers_gold_ids() {
        let oracle = oracle();
        let generate = oracle.cluster_id_generator();
        assert_eq!(generate(&[5, 1]), "b");
        assert_eq!(generate(&[8, 1]), "new-2");
        assert_eq!(generate(&[]), "new-0");
        assert_eq!(oracle.gold_cluster_of(&3).map(|c| c.len()), Some(3));
    }
}
