//! Cluster refinement: split incoherent clusters into coherent sub-clusters.
//!
//! Transitive closure leans toward recall: one wrong duplicate judgment glues
//! two unrelated groups together. Refinement looks at the pairwise weights
//! inside each cluster and picks the partition maximizing
//! [`score_partition`](super::partition::score_partition).
//!
//! - Clusters with at most two members pass through.
//! - Clusters up to `max_small_cluster_size` members are solved exactly by
//!   enumerating all set partitions. Missing weights are requested from the
//!   classifier the first time the search needs them.
//! - Larger clusters get a sparse edge sample of `T(max_small_cluster_size)`
//!   edges (known judgments first, grown by closing triangles, topped up at
//!   random once triangles run out) and are partitioned greedily.
//!
//! A cluster whose best partition has a single part is returned unchanged.
//! Otherwise every part becomes a new cluster with an id minted from its
//! member ids.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

use super::edge::{expand_by_triangles, random_edges, EdgeWeight, WeightMatrix, WeightedEdge};
use super::greedy::GreedyClustering;
use super::partition::best_partition;
use super::types::{Cluster, ClusterIdGenerator, IdExtractor};
use super::util::triangular_number;
use crate::classify::{ClassifiedCandidate, Classifier};
use crate::error::{Error, Result};

/// Refinement parameters.
#[derive(Clone, Debug)]
pub struct RefineConfig {
    /// Largest cluster (inclusive) that is refined by exhaustive search.
    ///
    /// Search cost grows with the Bell number of this size; larger clusters use
    /// the greedy heuristic over `T(max_small_cluster_size)` sampled edges.
    pub max_small_cluster_size: usize,

    /// Optional RNG seed for reproducible edge sampling.
    pub seed: Option<u64>,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            max_small_cluster_size: 10,
            seed: None,
        }
    }
}

/// Splits clusters whose members are not mutual duplicates.
pub struct RefineCluster<C, T, I> {
    config: RefineConfig,
    classifier: Arc<dyn Classifier<T>>,
    id_extractor: IdExtractor<T, I>,
    id_generator: ClusterIdGenerator<I, C>,
    rng: StdRng,
}

impl<C, T, I> RefineCluster<C, T, I>
where
    I: Eq + Hash,
{
    /// Create a refiner with the default configuration.
    pub fn new<K>(
        classifier: K,
        id_extractor: IdExtractor<T, I>,
        id_generator: ClusterIdGenerator<I, C>,
    ) -> Self
    where
        K: Classifier<T> + 'static,
    {
        let config = RefineConfig::default();
        Self {
            rng: seeded_rng(config.seed),
            config,
            classifier: Arc::new(classifier),
            id_extractor,
            id_generator,
        }
    }

    /// Replace the configuration (and reseed the RNG accordingly).
    pub fn with_config(mut self, config: RefineConfig) -> Self {
        self.rng = seeded_rng(config.seed);
        self.config = config;
        self
    }

    /// Set the largest cluster size solved exactly.
    pub fn with_max_small_cluster_size(mut self, max_small_cluster_size: usize) -> Self {
        self.config.max_small_cluster_size = max_small_cluster_size;
        self
    }

    /// Seed the edge-sampling RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// The generator used for sub-cluster ids.
    pub fn cluster_id_generator(&self) -> ClusterIdGenerator<I, C> {
        Arc::clone(&self.id_generator)
    }

    /// The record id extractor.
    pub fn id_extractor(&self) -> IdExtractor<T, I> {
        Arc::clone(&self.id_extractor)
    }

    /// Refine every cluster independently.
    ///
    /// `known` holds judgments already made for pairs of records; only pairs
    /// with both records inside the same cluster are used.
    pub fn refine(
        &mut self,
        clusters: Vec<Cluster<C, T>>,
        known: &[ClassifiedCandidate<T>],
    ) -> Result<Vec<Cluster<C, T>>> {
        let index = KnownClassifications::new(known, &self.id_extractor);
        let mut refined = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            refined.extend(self.refine_cluster(cluster, &index)?);
        }
        Ok(refined)
    }

    pub(crate) fn refine_cluster(
        &mut self,
        cluster: Cluster<C, T>,
        index: &KnownClassifications<'_, T, I>,
    ) -> Result<Vec<Cluster<C, T>>> {
        if self.config.max_small_cluster_size == 0 {
            return Err(Error::InvalidParameter {
                name: "max_small_cluster_size",
                message: "must be at least 1",
            });
        }
        if cluster.is_empty() {
            return Err(Error::EmptyCluster);
        }
        if cluster.len() <= 2 {
            return Ok(vec![cluster]);
        }

        let known = index.edges_within(&cluster, &self.id_extractor);
        let assignment = if cluster.len() > self.config.max_small_cluster_size {
            self.refine_large(&cluster, known)?
        } else {
            self.refine_small(&cluster, &known)?
        };
        Ok(self.split(cluster, &assignment))
    }

    /// Exhaustive search with a lazily filled weight matrix.
    fn refine_small(&self, cluster: &Cluster<C, T>, known: &[WeightedEdge]) -> Result<Vec<usize>> {
        let n = cluster.len();
        let mut weights = WeightMatrix::new(n);
        for edge in known {
            if let EdgeWeight::Known(w) = edge.weight() {
                weights.set(edge.left(), edge.right(), w);
            }
        }

        let elements = cluster.elements();
        let classifier = &self.classifier;
        let assignment = best_partition(n, |i, j| {
            weights.resolve(i, j, || {
                Ok(classifier.classify(&elements[i], &elements[j])?.weight())
            })
        })?;
        trace!(size = n, known = known.len(), evaluated = weights.num_known(), "exact refinement");
        Ok(assignment)
    }

    /// Greedy partitioning over a sparse edge sample.
    fn refine_large(
        &mut self,
        cluster: &Cluster<C, T>,
        mut known: Vec<WeightedEdge>,
    ) -> Result<Vec<usize>> {
        let n = cluster.len();
        let desired = triangular_number(self.config.max_small_cluster_size);
        let edges = if known.is_empty() {
            random_edges(n, desired, &mut self.rng)
        } else {
            known.shuffle(&mut self.rng);
            expand_by_triangles(known, n, desired, &mut self.rng)?
        };

        let elements = cluster.elements();
        let scored = edges
            .into_iter()
            .map(|edge| match edge.weight() {
                EdgeWeight::Known(_) => Ok(edge),
                EdgeWeight::Unknown => {
                    let result = self
                        .classifier
                        .classify(&elements[edge.left()], &elements[edge.right()])?;
                    Ok(edge.scored(result.weight()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        trace!(size = n, edges = scored.len(), "heuristic refinement");

        GreedyClustering::new().partition(n, &scored)
    }

    /// Materialize one cluster per label, in order of first occurrence.
    fn split(&self, cluster: Cluster<C, T>, assignment: &[usize]) -> Vec<Cluster<C, T>> {
        let distinct: HashSet<usize> = assignment.iter().copied().collect();
        if distinct.len() <= 1 {
            return vec![cluster];
        }

        let size = cluster.len();
        let mut order: Vec<usize> = Vec::with_capacity(distinct.len());
        let mut parts: HashMap<usize, Vec<T>> = HashMap::with_capacity(distinct.len());
        for (&label, element) in assignment.iter().zip(cluster.into_elements()) {
            parts
                .entry(label)
                .or_insert_with(|| {
                    order.push(label);
                    Vec::new()
                })
                .push(element);
        }

        debug!(size, parts = order.len(), "split cluster");
        order
            .into_iter()
            .filter_map(|label| parts.remove(&label))
            .map(|elements| {
                let ids: Vec<I> = elements.iter().map(|e| (self.id_extractor)(e)).collect();
                Cluster::new((self.id_generator)(&ids), elements)
            })
            .collect()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Known judgments indexed by the id of their first record.
pub(crate) struct KnownClassifications<'a, T, I> {
    by_record1: HashMap<I, Vec<&'a ClassifiedCandidate<T>>>,
}

impl<'a, T, I> KnownClassifications<'a, T, I>
where
    I: Eq + Hash,
{
    pub(crate) fn new(known: &'a [ClassifiedCandidate<T>], id_extractor: &IdExtractor<T, I>) -> Self {
        let mut by_record1: HashMap<I, Vec<&'a ClassifiedCandidate<T>>> = HashMap::new();
        for classified in known {
            by_record1
                .entry(id_extractor(&classified.candidate.record1))
                .or_default()
                .push(classified);
        }
        Self { by_record1 }
    }

    /// Weighted edges for judgments whose records both lie in `cluster`.
    ///
    /// The first judgment for a pair wins; self pairs are dropped.
    pub(crate) fn edges_within<C>(
        &self,
        cluster: &Cluster<C, T>,
        id_extractor: &IdExtractor<T, I>,
    ) -> Vec<WeightedEdge> {
        let mut positions: HashMap<I, usize> = HashMap::with_capacity(cluster.len());
        for (pos, element) in cluster.iter().enumerate() {
            positions.entry(id_extractor(element)).or_insert(pos);
        }

        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        let mut edges = Vec::new();
        for (pos, element) in cluster.iter().enumerate() {
            let Some(judgments) = self.by_record1.get(&id_extractor(element)) else {
                continue;
            };
            for classified in judgments {
                let other = id_extractor(&classified.candidate.record2);
                let Some(&other_pos) = positions.get(&other) else {
                    continue;
                };
                if other_pos == pos {
                    continue;
                }
                let edge = WeightedEdge::new(pos, other_pos, classified.result.weight());
                if seen.insert(edge.key()) {
                    edges.push(edge);
                }
            }
        }
        edges
    }
}
