//! Deterministic collaborators shared by the integration tests.

use lexical_ambiguity::{SenseCandidate, TextProcessor};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[expect(clippy::float_arithmetic, reason = "tolerance comparison")]
#[must_use]
pub fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

/// Failure raised by the fake collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0} unavailable")]
pub struct Unavailable(pub String);

/// Splits on whitespace and strips surrounding punctuation.
#[derive(Default)]
pub struct WhitespaceTokenizer {
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl WhitespaceTokenizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextProcessor for WhitespaceTokenizer {
    type Output = Vec<String>;
    type Error = Unavailable;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Unavailable("tokenizer".into()));
        }
        Ok(input
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .map(str::to_owned)
            .collect())
    }
}

/// Lexicon backed by a map, with optional per-word failures.
#[derive(Default)]
pub struct FakeLexicon {
    senses: HashMap<String, Vec<SenseCandidate>>,
    failing: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeLexicon {
    #[must_use]
    pub fn with(mut self, word: &str, definitions: &[&str]) -> Self {
        let senses = definitions
            .iter()
            .enumerate()
            .map(|(i, definition)| SenseCandidate::new(format!("{word}-{i}"), *definition))
            .collect();
        self.senses.insert(word.to_owned(), senses);
        self
    }

    #[must_use]
    pub fn failing(mut self, word: &str) -> Self {
        self.failing.insert(word.to_owned());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextProcessor for FakeLexicon {
    type Output = Vec<SenseCandidate>;
    type Error = Unavailable;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(input) {
            return Err(Unavailable(format!("senses for {input}")));
        }
        Ok(self.senses.get(input).cloned().unwrap_or_default())
    }
}

/// Embedding table with optional failures and an artificial delay.
#[derive(Default)]
pub struct FakeEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    delay: Duration,
    slow: HashMap<String, Duration>,
    pub calls: AtomicUsize,
}

impl FakeEmbedder {
    #[must_use]
    pub fn with(mut self, text: &str, vector: &[f32]) -> Self {
        self.vectors.insert(text.to_owned(), vector.to_vec());
        self
    }

    #[must_use]
    pub fn failing(mut self, text: &str) -> Self {
        self.failing.insert(text.to_owned());
        self
    }

    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay only the call that embeds `text`.
    #[must_use]
    pub fn slow(mut self, text: &str, delay: Duration) -> Self {
        self.slow.insert(text.to_owned(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextProcessor for FakeEmbedder {
    type Output = Box<[f32]>;
    type Error = Unavailable;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.slow.get(input).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        if self.failing.contains(input) {
            return Err(Unavailable(format!("embedding for {input}")));
        }
        self.vectors
            .get(input)
            .map(|v| v.clone().into_boxed_slice())
            .ok_or_else(|| Unavailable(format!("embedding for {input}")))
    }
}

pub const SENTENCE: &str = "Ion și Maria stau pe bancă lângă casă cu o broască.";

/// Senses for a handful of Romanian words.
///
/// - `bancă` has two unrelated senses and its word vector matches only one.
/// - `casă` has two near-identical senses close to the word vector.
/// - `broască` has two senses, one of whose definitions cannot be embedded.
/// - `și` has a single sense.
pub fn romanian_lexicon() -> FakeLexicon {
    FakeLexicon::default()
        .with("bancă", &["instituție financiară", "scaun lung"])
        .with("casă", &["clădire de locuit", "locuință"])
        .with("broască", &["animal amfibian", "mecanism de încuiat"])
        .with("și", &["conjuncție copulativă"])
}

pub fn romanian_embeddings() -> FakeEmbedder {
    FakeEmbedder::default()
        .with("bancă", &[1.0, 0.0, 0.0])
        .with("instituție financiară", &[1.0, 0.0, 0.0])
        .with("scaun lung", &[0.0, 1.0, 0.0])
        .with("casă", &[1.0, 1.0, 0.0])
        .with("clădire de locuit", &[1.0, 1.0, 0.0])
        .with("locuință", &[1.0, 0.9, 0.0])
        .with("broască", &[0.0, 0.0, 1.0])
        .with("animal amfibian", &[0.0, 0.1, 1.0])
        .failing("mecanism de încuiat")
        .with("și", &[1.0, 0.0, 0.0])
        .with("conjuncție copulativă", &[0.0, 0.0, 1.0])
}
