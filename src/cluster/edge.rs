//! Weighted edges between members of one cluster, and the sparse edge
//! sampling used when a cluster is too large for exhaustive search.

use std::collections::HashSet;

use rand::seq::{index, SliceRandom};
use rand::Rng;
use tracing::{debug, trace};

use super::util::{gauss_pair, num_pairs, triangular_number};
use crate::error::{Error, Result};

/// Weight of a pair of cluster members.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeWeight {
    /// Not evaluated yet; computed on demand by the classifier.
    Unknown,
    /// Signed weight in `[-1, 1]`.
    Known(f64),
}

impl EdgeWeight {
    /// The weight, if known.
    pub fn value(self) -> Option<f64> {
        match self {
            EdgeWeight::Known(w) => Some(w),
            EdgeWeight::Unknown => None,
        }
    }

    /// True if the weight still has to be computed.
    pub fn is_unknown(self) -> bool {
        matches!(self, EdgeWeight::Unknown)
    }
}

/// An edge between two positions of a cluster's element sequence.
///
/// Always stored with `left < right`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    left: usize,
    right: usize,
    weight: EdgeWeight,
}

impl WeightedEdge {
    /// Edge with a known weight. Endpoints are stored in canonical order.
    pub fn new(a: usize, b: usize, weight: f64) -> Self {
        Self::with_edge_weight(a, b, EdgeWeight::Known(weight))
    }

    /// Edge whose weight has not been evaluated yet.
    pub fn unscored(a: usize, b: usize) -> Self {
        Self::with_edge_weight(a, b, EdgeWeight::Unknown)
    }

    fn with_edge_weight(a: usize, b: usize, weight: EdgeWeight) -> Self {
        Self {
            left: a.min(b),
            right: a.max(b),
            weight,
        }
    }

    /// Smaller endpoint.
    pub fn left(&self) -> usize {
        self.left
    }

    /// Larger endpoint.
    pub fn right(&self) -> usize {
        self.right
    }

    /// The weight cell.
    pub fn weight(&self) -> EdgeWeight {
        self.weight
    }

    /// Copy of this edge with a known weight.
    pub fn scored(self, weight: f64) -> Self {
        Self {
            weight: EdgeWeight::Known(weight),
            ..self
        }
    }

    /// Canonical `(left, right)` key.
    pub fn key(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    /// True if both endpoints coincide.
    pub fn is_self_pair(&self) -> bool {
        self.left == self.right
    }
}

/// Dense upper-triangular matrix of edge weights for one cluster.
///
/// Cells start out [`EdgeWeight::Unknown`] and are filled lazily.
#[derive(Clone, Debug)]
pub struct WeightMatrix {
    n: usize,
    cells: Vec<EdgeWeight>,
}

impl WeightMatrix {
    /// All-unknown matrix for `n` elements.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            cells: vec![EdgeWeight::Unknown; n * n],
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a matrix over zero elements.
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    fn cell(&self, a: usize, b: usize) -> usize {
        let (i, j) = (a.min(b), a.max(b));
        i * self.n + j
    }

    /// Weight of the pair `(a, b)` in either order.
    pub fn get(&self, a: usize, b: usize) -> EdgeWeight {
        self.cells[self.cell(a, b)]
    }

    /// Record a known weight for `(a, b)`.
    pub fn set(&mut self, a: usize, b: usize, weight: f64) {
        let cell = self.cell(a, b);
        self.cells[cell] = EdgeWeight::Known(weight);
    }

    /// Weight of `(a, b)`, computing and caching it on first access.
    pub fn resolve<F>(&mut self, a: usize, b: usize, compute: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        let cell = self.cell(a, b);
        match self.cells[cell] {
            EdgeWeight::Known(w) => Ok(w),
            EdgeWeight::Unknown => {
                let w = compute()?;
                self.cells[cell] = EdgeWeight::Known(w);
                Ok(w)
            }
        }
    }

    /// Number of cells that have been evaluated.
    pub fn num_known(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_unknown()).count()
    }
}

/// Draw up to `desired` distinct random edges among `n` elements.
///
/// Cell numbers are drawn without replacement from `[0, triangular_number(n))`,
/// decoded with [`gauss_pair`], and self pairs are dropped. The result holds
/// `min(desired, n * (n - 1) / 2)` unscored edges.
pub fn random_edges<R: Rng + ?Sized>(n: usize, desired: usize, rng: &mut R) -> Vec<WeightedEdge> {
    let potential = triangular_number(n);
    // At most `n` draws land on the diagonal.
    let amount = desired.saturating_add(n).min(potential);
    index::sample(rng, potential, amount)
        .into_iter()
        .map(gauss_pair)
        .filter(|&(row, col)| row != col)
        .map(|(row, col)| WeightedEdge::unscored(row, col))
        .take(desired)
        .collect()
}

/// Grow a set of edges by closing triangles until `desired` edges exist.
///
/// Each round adds, in shuffled order, the third edge of every pair of edges
/// that share a vertex. Once a round adds nothing (the known edges do not span
/// every element), the shortfall is drawn at random from the pairs not yet
/// present. Fails with [`Error::InsufficientEdges`] only if `desired` exceeds
/// the number of distinct pairs among `n` elements.
pub fn expand_by_triangles<R: Rng + ?Sized>(
    edges: Vec<WeightedEdge>,
    n: usize,
    desired: usize,
    rng: &mut R,
) -> Result<Vec<WeightedEdge>> {
    if desired > num_pairs(n) {
        return Err(Error::InsufficientEdges {
            desired,
            reached: num_pairs(n),
        });
    }
    let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(desired);
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut out: Vec<WeightedEdge> = Vec::with_capacity(desired.max(edges.len()));

    for edge in edges {
        if edge.is_self_pair() {
            continue;
        }
        if edge.right >= n {
            return Err(Error::EdgeOutOfBounds {
                index: edge.right,
                size: n,
            });
        }
        if seen.insert(edge.key()) {
            adjacency[edge.left].push(edge.right);
            adjacency[edge.right].push(edge.left);
            out.push(edge);
        }
    }

    while out.len() < desired {
        let missing = desired - out.len();
        let mut added: Vec<WeightedEdge> = Vec::new();
        'vertices: for neighbors in &adjacency {
            for (k, &a) in neighbors.iter().enumerate() {
                for &b in &neighbors[k + 1..] {
                    let edge = WeightedEdge::unscored(a, b);
                    if seen.insert(edge.key()) {
                        added.push(edge);
                        if added.len() == missing {
                            break 'vertices;
                        }
                    }
                }
            }
        }

        if added.is_empty() {
            let filled = random_unseen_edges(n, missing, &mut seen, rng);
            debug!(known = out.len(), filled = filled.len(), "filled edge sample at random");
            out.extend(filled);
            break;
        }
        trace!(added = added.len(), total = out.len(), "closing triangles");

        added.shuffle(rng);
        for edge in added {
            adjacency[edge.left].push(edge.right);
            adjacency[edge.right].push(edge.left);
            out.push(edge);
        }
    }

    Ok(out)
}

/// Up to `missing` random edges whose keys are not in `seen`; `seen` is updated.
fn random_unseen_edges<R: Rng + ?Sized>(
    n: usize,
    missing: usize,
    seen: &mut HashSet<(usize, usize)>,
    rng: &mut R,
) -> Vec<WeightedEdge> {
    let potential = triangular_number(n);
    // At most `n` draws land on the diagonal and `seen.len()` on present edges.
    let amount = missing
        .saturating_add(n)
        .saturating_add(seen.len())
        .min(potential);
    index::sample(rng, potential, amount)
        .into_iter()
        .map(gauss_pair)
        .filter(|&(row, col)| row != col)
        .map(|(row, col)| WeightedEdge::unscored(row, col))
        .filter(|edge| seen.insert(edge.key()))
        .take(missing)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn edges_are_canonical() {
        let e = WeightedEdge::new(4, 1, 0.5);
        assert_eq!(e.key(), (1, 4));
        assert_eq!(e.weight(), EdgeWeight::Known(0.5));
        assert!(WeightedEdge::unscored(2, 3).weight().is_unknown());
    }

    #[test]
    fn matrix_resolves_once() {
        let mut m = WeightMatrix::new(3);
        m.set(2, 0, -1.0);
        assert_eq!(m.get(0, 2), EdgeWeight::Known(-1.0));

        let mut calls = 0;
        for _ in 0..3 {
            let w = m
                .resolve(1, 0, || {
                    calls += 1;
                    Ok(0.25)
                })
                .unwrap();
            assert_eq!(w, 0.25);
        }
        assert_eq!(calls, 1);
        assert_eq!(m.num_known(), 2);
    }

    #[test]
    fn random_edges_have_requested_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let edges = random_edges(11, 45, &mut rng);
        assert_eq!(edges.len(), 45);

        let keys: HashSet<_> = edges.iter().map(|e| e.key()).collect();
        assert_eq!(keys.len(), 45);
        assert!(edges.iter().all(|e| e.left() < e.right() && e.right() < 11));

        // More than there are pairs: all of them.
        assert_eq!(random_edges(5, 100, &mut rng).len(), 10);
    }

    #[test]
    fn triangles_complete_a_path() {
        let mut rng = StdRng::seed_from_u64(3);
        let path: Vec<_> = (0..5).map(|i| WeightedEdge::new(i, i + 1, 1.0)).collect();
        let edges = expand_by_triangles(path, 6, 15, &mut rng).unwrap();
        assert_eq!(edges.len(), 15);

        // Known weights survive; new edges are unscored.
        assert_eq!(edges[0].weight(), EdgeWeight::Known(1.0));
        assert!(edges[5..].iter().all(|e| e.weight().is_unknown()));
    }

    #[test]
    fn disconnected_edges_are_filled_at_random() {
        let mut rng = StdRng::seed_from_u64(3);
        let edges = vec![WeightedEdge::new(0, 1, 1.0), WeightedEdge::new(2, 3, 1.0)];
        let out = expand_by_triangles(edges, 4, 5, &mut rng).unwrap();
        assert_eq!(out.len(), 5);
        let keys: HashSet<_> = out.iter().map(|e| e.key()).collect();
        assert_eq!(keys.len(), 5);
        assert!(out[2..].iter().all(|e| e.weight().is_unknown()));
    }

    #[test]
    fn single_known_edge_grows_to_every_pair() {
        // A record appended to a chain leaves one known edge in its batch.
        let mut rng = StdRng::seed_from_u64(11);
        let known = vec![WeightedEdge::new(10, 11, 0.9)];
        let out = expand_by_triangles(known, 12, 55, &mut rng).unwrap();
        assert_eq!(out.len(), 55);
        assert_eq!(out[0].weight(), EdgeWeight::Known(0.9));

        let known = vec![WeightedEdge::new(3, 4, 0.9)];
        let all = expand_by_triangles(known, 5, 10, &mut rng).unwrap();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn more_edges_than_pairs_is_an_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let known = vec![WeightedEdge::new(0, 1, 1.0)];
        let err = expand_by_triangles(known, 4, 7, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientEdges {
                desired: 7,
                reached: 6
            }
        ));
    }
}
