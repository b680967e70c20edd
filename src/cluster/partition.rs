//! Exhaustive search over set partitions.
//!
//! A partition of `n` items is written as a *restricted growth string*: a label
//! per item where item 0 has label 0 and every later label is at most one
//! greater than the largest label before it. Each set partition has exactly
//! one such string, so enumerating the strings visits every partition once;
//! there are Bell(n) of them (52 for n = 5, 115 975 for n = 10).
//!
//! ## Objective
//!
//! For a partition `p` over `n` items and pair weights `w(i, j)`:
//!
//! ```text
//! same part:       score += w(i, j) / |p(i)|
//! different parts: score -= w(i, j) / (n - |p(i)|) + w(i, j) / (n - |p(j)|)
//! ```
//!
//! Positive pairs kept together count in full only inside small parts, so one
//! giant part does not win by default. Splitting a positive pair costs in
//! proportion to how small the rest of the cluster is.

use crate::error::{Error, Result};

/// Iterator over all restricted growth strings of length `n`.
///
/// Yields nothing for `n == 0`.
#[derive(Clone, Debug)]
pub struct SetPartitions {
    labels: Vec<usize>,
    started: bool,
    exhausted: bool,
}

impl SetPartitions {
    /// Enumerate the partitions of `n` items.
    pub fn new(n: usize) -> Self {
        Self {
            labels: vec![0; n],
            started: false,
            exhausted: n == 0,
        }
    }

    /// Incrementing `labels[i]` keeps the string canonical only while
    /// `labels[i]` does not exceed every label before it.
    fn can_increment(&self, i: usize) -> bool {
        self.labels[..i].iter().any(|&prev| self.labels[i] <= prev)
    }

    fn advance(&mut self) -> bool {
        for i in (1..self.labels.len()).rev() {
            if self.can_increment(i) {
                self.labels[i] += 1;
                for label in &mut self.labels[i + 1..] {
                    *label = 0;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for SetPartitions {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.exhausted {
            return None;
        }
        if self.started && !self.advance() {
            self.exhausted = true;
            return None;
        }
        self.started = true;
        Some(self.labels.clone())
    }
}

/// Score a partition given as one label per item, with labels in `[0, n)`.
///
/// `weight(i, j)` is called for every pair `i < j` in row-major order; it may
/// compute weights lazily and fail.
pub fn score_partition<F>(assignment: &[usize], mut weight: F) -> Result<f64>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    let n = assignment.len();
    let mut sizes = vec![0usize; n];
    for &label in assignment {
        if label >= n {
            return Err(Error::InvalidParameter {
                name: "assignment",
                message: "labels must be smaller than the number of items",
            });
        }
        sizes[label] += 1;
    }

    let mut score = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let w = weight(i, j)?;
            let (pi, pj) = (assignment[i], assignment[j]);
            if pi == pj {
                score += w / sizes[pi] as f64;
            } else {
                score -= w / (n - sizes[pi]) as f64 + w / (n - sizes[pj]) as f64;
            }
        }
    }
    Ok(score)
}

/// The partition of `n` items with the highest score.
///
/// Ties go to the partition enumerated first.
pub fn best_partition<F>(n: usize, mut weight: F) -> Result<Vec<usize>>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    if n == 0 {
        return Err(Error::EmptyCluster);
    }

    let mut best: Option<(Vec<usize>, f64)> = None;
    for assignment in SetPartitions::new(n) {
        let score = score_partition(&assignment, &mut weight)?;
        if best.as_ref().map_or(true, |(_, top)| score > *top) {
            best = Some((assignment, score));
        }
    }

    best.map(|(assignment, _)| assignment)
        .ok_or(Error::NoPartition { size: n })
}
