//! Classify selected candidate pairs and cluster the judgments.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::classify::{Candidate, ClassifiedCandidate, Classifier};
use crate::cluster::{Cluster, Clustering};
use crate::error::{Error, Result};

/// Collects errors from fallible steps instead of aborting.
#[derive(Debug, Default)]
pub struct ErrorContext {
    errors: Vec<Error>,
}

impl ErrorContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, keeping its error (if any) and returning `None` in its place.
    pub fn safe_execute<R, F>(&mut self, f: F) -> Option<R>
    where
        F: FnOnce() -> Result<R>,
    {
        match f() {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(error = %err, "suppressing error");
                self.errors.push(err);
                None
            }
        }
    }

    /// Errors collected so far.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Drain the collected errors.
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }
}

/// What to do when the classifier fails on a candidate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Propagate the first failure.
    #[default]
    FailFast,
    /// Skip the candidate and record the failure in the [`ErrorContext`].
    Collect,
}

/// Duplicate detection over already selected candidate pairs.
pub struct PairBasedDuplicateDetection<C, T, I, K> {
    classifier: Arc<dyn Classifier<T>>,
    clustering: K,
    policy: ErrorPolicy,
    errors: ErrorContext,
    _marker: PhantomData<fn() -> (C, I)>,
}

impl<C, T, I, K> PairBasedDuplicateDetection<C, T, I, K>
where
    K: Clustering<C, T, I>,
{
    /// Combine a classifier with a clustering. Failures propagate by default.
    pub fn new<F>(classifier: F, clustering: K) -> Self
    where
        F: Classifier<T> + 'static,
    {
        Self {
            classifier: Arc::new(classifier),
            clustering,
            policy: ErrorPolicy::default(),
            errors: ErrorContext::new(),
            _marker: PhantomData,
        }
    }

    /// Set the classifier error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Errors skipped under [`ErrorPolicy::Collect`].
    pub fn error_context(&mut self) -> &mut ErrorContext {
        &mut self.errors
    }

    /// The wrapped clustering.
    pub fn clustering(&self) -> &K {
        &self.clustering
    }

    /// Classify every candidate and fold the judgments into the clustering.
    ///
    /// Returns the clusters the clustering reports as changed.
    pub fn detect(&mut self, candidates: Vec<Candidate<T>>) -> Result<Vec<Cluster<C, T>>> {
        let mut classified = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let judged = match self.policy {
                ErrorPolicy::FailFast => Some(self.classifier.classify_candidate(candidate)?),
                ErrorPolicy::Collect => {
                    let classifier = &self.classifier;
                    self.errors
                        .safe_execute(|| classifier.classify_candidate(candidate))
                }
            };
            classified.extend(judged);
        }
        debug!(classified = classified.len(), "classified candidates");
        self.clustering.cluster(&classified)
    }

    /// Fold already classified candidates into the clustering.
    pub fn cluster_classified(
        &mut self,
        classified: &[ClassifiedCandidate<T>],
    ) -> Result<Vec<Cluster<C, T>>> {
        self.clustering.cluster(classified)
    }
}
