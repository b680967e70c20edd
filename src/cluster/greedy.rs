//! Greedy agglomerative partitioning for clusters too large to search exhaustively.
//!
//! Every item starts in its own part. Edges are visited once, strongest first;
//! each visit tentatively merges the two parts the edge connects and keeps the
//! merge only if it strictly raises the partition score (see
//! [`score_partition`](super::partition::score_partition)). Pairs without an
//! edge count as weight zero and contribute nothing, so the score is evaluated
//! over the edge list alone and each evaluation costs `O(edges)`.
//!
//! The result depends on the edge order. Edges are sorted once by weight,
//! descending, with a stable sort, so equal weights keep their input order.

use std::collections::HashSet;

use super::edge::WeightedEdge;
use crate::error::{Error, Result};

/// Greedy edge-driven partitioner.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyClustering;

impl GreedyClustering {
    /// Create a partitioner.
    pub fn new() -> Self {
        Self
    }

    /// Partition `n` items using the given scored edges.
    ///
    /// Returns one label per item. Fails if an edge is unscored or addresses
    /// an item outside `0..n`. Self pairs are ignored; for a repeated pair the
    /// first edge wins.
    pub fn partition(&self, n: usize, edges: &[WeightedEdge]) -> Result<Vec<usize>> {
        let mut seen = HashSet::with_capacity(edges.len());
        let mut ordered: Vec<(usize, usize, f64)> = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.right() >= n {
                return Err(Error::EdgeOutOfBounds {
                    index: edge.right(),
                    size: n,
                });
            }
            let w = edge.weight().value().ok_or(Error::UnscoredEdge {
                left: edge.left(),
                right: edge.right(),
            })?;
            if !edge.is_self_pair() && seen.insert(edge.key()) {
                ordered.push((edge.left(), edge.right(), w));
            }
        }
        ordered.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut parts = Parts::new(n);
        let mut score = parts.score(&ordered, None);

        for &(left, right, _) in &ordered {
            let keep = parts.find(left);
            let absorb = parts.find(right);
            if keep == absorb {
                continue;
            }

            let merged_score = parts.score(&ordered, Some((keep, absorb)));
            if merged_score > score {
                score = merged_score;
                parts.merge(keep, absorb);
            }
        }

        Ok((0..n).map(|item| parts.find(item)).collect())
    }
}

/// Disjoint parts with sizes. A part is labelled by its root item, and a
/// merge keeps the root of the part it merges into.
struct Parts {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl Parts {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn merge(&mut self, keep: usize, absorb: usize) {
        self.parent[absorb] = keep;
        self.size[keep] += self.size[absorb];
    }

    /// Root of `x`'s part, as if `merge` (`(keep, absorb)`) had been applied.
    fn root(&mut self, x: usize, merge: Option<(usize, usize)>) -> usize {
        let root = self.find(x);
        match merge {
            Some((keep, absorb)) if root == absorb => keep,
            _ => root,
        }
    }

    fn part_size(&self, root: usize, merge: Option<(usize, usize)>) -> usize {
        match merge {
            Some((keep, absorb)) if root == keep => self.size[keep] + self.size[absorb],
            _ => self.size[root],
        }
    }

    /// Partition score restricted to `edges`, optionally with one pending merge.
    fn score(&mut self, edges: &[(usize, usize, f64)], merge: Option<(usize, usize)>) -> f64 {
        let n = self.parent.len();
        let mut score = 0.0;
        for &(i, j, w) in edges {
            let (pi, pj) = (self.root(i, merge), self.root(j, merge));
            let si = self.part_size(pi, merge);
            if pi == pj {
                score += w / si as f64;
            } else {
                let sj = self.part_size(pj, merge);
                score -= w / (n - si) as f64 + w / (n - sj) as f64;
            }
        }
        score
    }
}
