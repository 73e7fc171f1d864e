use serde::{Deserialize, Serialize};

use crate::config::Threshold;

/// Outcome of scoring one distinct token against its senses.
///
/// `similarity` is the cosine similarity between the word's embedding and the
/// mean embedding of its sense definitions, always within `[-1, 1]`.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::{Threshold, api::AmbiguityResult};
///
/// let r = AmbiguityResult::new("bancă", 0.42, 2, 2, Threshold::default());
/// assert!(r.is_ambiguous);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityResult {
    pub word: String,
    pub similarity: f32,
    pub is_ambiguous: bool,
    /// Senses registered for the word.
    pub sense_count: usize,
    /// Senses whose definitions contributed to the aggregate vector.
    pub senses_used: usize,
}

impl AmbiguityResult {
    /// Build a result, deciding ambiguity against `threshold`.
    #[must_use]
    pub fn new(
        word: impl Into<String>,
        similarity: f32,
        sense_count: usize,
        senses_used: usize,
        threshold: Threshold,
    ) -> Self {
        Self {
            word: word.into(),
            similarity,
            is_ambiguous: threshold.flags(similarity),
            sense_count,
            senses_used,
        }
    }
}

/// A token that could not be scored, with the reason rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedToken {
    pub word: String,
    pub reason: String,
}

/// Diagnostic trace for one detection call.
///
/// `results` holds every token that reached a similarity score, in first
/// occurrence order. Tokens with fewer than two senses appear in neither list.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::{Threshold, api::{AmbiguityReport, AmbiguityResult}};
///
/// let report = AmbiguityReport {
///     text: "bancă".into(),
///     threshold: 0.8,
///     results: vec![AmbiguityResult::new("bancă", 0.1, 2, 2, Threshold::default())],
///     skipped: Vec::new(),
///     cancelled: false,
/// };
/// assert_eq!(report.ambiguous_words(), vec!["bancă".to_owned()]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityReport {
    pub text: String,
    pub threshold: f32,
    pub results: Vec<AmbiguityResult>,
    pub skipped: Vec<SkippedToken>,
    /// Set when the call was cancelled before every token was evaluated.
    pub cancelled: bool,
}

impl AmbiguityReport {
    /// An empty report for `text`.
    #[must_use]
    pub fn empty(text: impl Into<String>, threshold: f32) -> Self {
        Self {
            text: text.into(),
            threshold,
            results: Vec::new(),
            skipped: Vec::new(),
            cancelled: false,
        }
    }

    /// Flagged words in first-occurrence order.
    #[must_use]
    pub fn ambiguous_words(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.is_ambiguous)
            .map(|r| r.word.clone())
            .collect()
    }
}

/// Detects words whose usage drifts away from their registered senses.
pub trait AmbiguityDetector {
    /// Error type returned when detection cannot run at all.
    type Error: std::error::Error + Send + Sync;

    /// Flag ambiguous words in `text`, in first-occurrence order.
    ///
    /// # Errors
    ///
    /// Returns an error if `threshold` is invalid or the text cannot be
    /// tokenized.
    fn find_ambiguous_words(&self, text: &str, threshold: f32) -> Result<Vec<String>, Self::Error> {
        self.trace(text, threshold)
            .map(|report| report.ambiguous_words())
    }

    /// Produce the full diagnostic report for `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if `threshold` is invalid or the text cannot be
    /// tokenized.
    fn trace(&self, text: &str, threshold: f32) -> Result<AmbiguityReport, Self::Error>;
}
