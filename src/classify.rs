//! Pairwise classification: the contract between the clustering engine and
//! whatever decides whether two records are duplicates.
//!
//! The engine never looks inside records. It consumes [`ClassifiedCandidate`]s
//! produced upstream and, during refinement, calls a [`Classifier`] on demand
//! for pairs it has no judgment for yet.

use crate::error::{Error, Result};

/// An ordered pair of records under comparison.
///
/// `(a, b)` and `(b, a)` are distinct candidates unless the caller normalizes them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Candidate<T> {
    /// First record.
    pub record1: T,
    /// Second record.
    pub record2: T,
}

impl<T> Candidate<T> {
    /// Pair two records.
    pub fn new(record1: T, record2: T) -> Self {
        Self { record1, record2 }
    }
}

/// Verdict of a pairwise classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Both records describe the same entity.
    Duplicate,
    /// The records describe different entities.
    NonDuplicate,
    /// The classifier cannot tell.
    Unknown,
}

/// A classification together with its confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    classification: Classification,
    confidence: f64,
    explanation: String,
}

impl ClassificationResult {
    /// Create a result, rejecting confidences outside `[0, 1]`.
    pub fn new(classification: Classification, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::InvalidParameter {
                name: "confidence",
                message: "must be within [0, 1]",
            });
        }
        Ok(Self {
            classification,
            confidence,
            explanation: String::new(),
        })
    }

    /// Duplicate verdict. The confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn duplicate(confidence: f64) -> Self {
        Self::clamped(Classification::Duplicate, confidence)
    }

    /// Non-duplicate verdict. The confidence is clamped into `[0, 1]`; NaN becomes 0.
    pub fn non_duplicate(confidence: f64) -> Self {
        Self::clamped(Classification::NonDuplicate, confidence)
    }

    /// Unknown verdict with zero confidence.
    pub fn unknown() -> Self {
        Self::clamped(Classification::Unknown, 0.0)
    }

    fn clamped(classification: Classification, confidence: f64) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            classification,
            confidence,
            explanation: String::new(),
        }
    }

    /// Attach a human-readable explanation.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// The verdict.
    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// Confidence in `[0, 1]`.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Free-text explanation (empty unless set).
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// True for [`Classification::Duplicate`].
    pub fn is_duplicate(&self) -> bool {
        self.classification == Classification::Duplicate
    }

    /// Signed edge weight used by refinement.
    ///
    /// Duplicate maps to `+confidence`, non-duplicate to `-confidence`, and
    /// unknown to `-0.0`.
    pub fn weight(&self) -> f64 {
        match self.classification {
            Classification::Duplicate => self.confidence,
            Classification::NonDuplicate => -self.confidence,
            Classification::Unknown => -0.0,
        }
    }
}

/// A candidate paired with its classification.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedCandidate<T> {
    /// The compared pair.
    pub candidate: Candidate<T>,
    /// The verdict for the pair.
    pub result: ClassificationResult,
}

impl<T> ClassifiedCandidate<T> {
    /// Pair a candidate with its result.
    pub fn new(candidate: Candidate<T>, result: ClassificationResult) -> Self {
        Self { candidate, result }
    }

    /// Shorthand for a classified pair of records.
    pub fn of(record1: T, record2: T, result: ClassificationResult) -> Self {
        Self::new(Candidate::new(record1, record2), result)
    }

    /// True if the pair was classified as duplicate.
    pub fn is_duplicate(&self) -> bool {
        self.result.is_duplicate()
    }
}

/// Decides whether two records are duplicates.
///
/// Implementations must be pure with respect to the clustering state:
/// refinement caches results and only asks for pairs it has not seen.
pub trait Classifier<T> {
    /// Classify a pair of records.
    fn classify(&self, record1: &T, record2: &T) -> Result<ClassificationResult>;

    /// Classify a candidate and keep it together with its result.
    fn classify_candidate(&self, candidate: Candidate<T>) -> Result<ClassifiedCandidate<T>> {
        let result = self.classify(&candidate.record1, &candidate.record2)?;
        Ok(ClassifiedCandidate::new(candidate, result))
    }
}

impl<T, F> Classifier<T> for F
where
    F: Fn(&T, &T) -> Result<ClassificationResult>,
{
    fn classify(&self, record1: &T, record2: &T) -> Result<ClassificationResult> {
        self(record1, record2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_follow_verdicts() {
        assert_eq!(ClassificationResult::duplicate(0.8).weight(), 0.8);
        assert_eq!(ClassificationResult::non_duplicate(0.3).weight(), -0.3);

        let unknown = ClassificationResult::unknown().weight();
        assert_eq!(unknown, 0.0);
        assert!(unknown.is_sign_negative());
    }

    #[test]
    fn confidence_is_validated_or_clamped() {
        assert!(ClassificationResult::new(Classification::Duplicate, 1.5).is_err());
        assert!(ClassificationResult::new(Classification::Duplicate, f64::NAN).is_err());
        assert!(ClassificationResult::new(Classification::Unknown, 0.0).is_ok());

        assert_eq!(ClassificationResult::duplicate(3.0).confidence(), 1.0);
        assert_eq!(ClassificationResult::non_duplicate(-1.0).confidence(), 0.0);
        assert_eq!(ClassificationResult::duplicate(f64::NAN).confidence(), 0.0);
    }

    #[test]
    fn closures_are_classifiers() {
        let same_parity = |a: &u32, b: &u32| -> Result<ClassificationResult> {
            if a % 2 == b % 2 {
                Ok(ClassificationResult::duplicate(1.0).with_explanation("same parity"))
            } else {
                Ok(ClassificationResult::non_duplicate(1.0))
            }
        };

        let classified = same_parity.classify_candidate(Candidate::new(2, 4)).unwrap();
        assert!(classified.is_duplicate());
        assert_eq!(classified.result.explanation(), "same parity");
        assert!(!same_parity.classify(&1, &2).unwrap().is_duplicate());
    }
}
