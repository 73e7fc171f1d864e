//! Provider interfaces for the tokenizer, lexical resource, and embedding
//! collaborators.
//!
//! Defines the `TextProcessor` trait and the provider aliases consumed by the
//! ambiguity scorer.

mod cache;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use cache::CachedProcessor;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Processes text to produce a structured, thread-safe output.
///
/// The tokenizer, the lexical resource, and the embedding provider all
/// implement this trait. Sharing one contract lets the scorer treat every
/// collaborator the same way and lets tests swap in deterministic fakes.
pub trait TextProcessor {
    /// Structured result returned by the processor.
    ///
    /// Outputs must be `Send + Sync + 'static` so they can cross the worker
    /// pool that evaluates tokens.
    type Output: Send + Sync + 'static;
    /// Error type returned when processing fails.
    ///
    /// Errors must be `Send + Sync + 'static` so per-token failures can be
    /// boxed and reported after the pool joins.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Process the supplied text.
    ///
    /// # Errors
    ///
    /// Returns an error if processing fails.
    fn process(&self, input: &str) -> Result<Self::Output, Self::Error>;
}

impl<P: TextProcessor + ?Sized> TextProcessor for &P {
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        (**self).process(input)
    }
}

impl<P: TextProcessor + ?Sized> TextProcessor for Arc<P> {
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        (**self).process(input)
    }
}

/// One registered meaning of a word, as returned by a lexical resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseCandidate {
    /// Opaque identifier assigned by the lexical resource.
    #[serde(rename = "id")]
    pub sense_id: String,
    /// Human-readable gloss. Senses with an empty definition are not scored.
    #[serde(default)]
    pub definition: String,
}

impl SenseCandidate {
    /// Build a sense from its identifier and definition.
    #[must_use]
    pub fn new(sense_id: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            sense_id: sense_id.into(),
            definition: definition.into(),
        }
    }
}

/// Splits raw text into wordforms in reading order.
pub type TextTokenizer<E> =
    dyn TextProcessor<Output = Vec<String>, Error = E> + Send + Sync + 'static;

/// Looks up the registered senses of a literal wordform.
pub type LexicalResource<E> =
    dyn TextProcessor<Output = Vec<SenseCandidate>, Error = E> + Send + Sync + 'static;

/// Provides semantic vectors for text.
pub type EmbeddingProvider<E> =
    dyn TextProcessor<Output = Box<[f32]>, Error = E> + Send + Sync + 'static;
