//! Fatal and per-token error types for ambiguity detection.

use std::time::Duration;
use thiserror::Error;

use crate::{config::ConfigError, vector::VectorError};

/// Type-erased collaborator error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that abort a whole detection call.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The tokenizer could not produce tokens for the text.
    #[error("tokenization failed: {0}")]
    Tokenization(#[source] BoxError),
    /// The call was configured with invalid values.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Reasons a single token is left unscored.
///
/// None of these abort the call; the token is reported as skipped and simply
/// not flagged.
#[derive(Debug, Error)]
pub enum TokenFailure {
    /// The lexical resource lookup failed.
    #[error("lexical resource lookup failed: {0}")]
    LexicalResource(#[source] BoxError),
    /// The word itself could not be embedded.
    #[error("embedding failed: {0}")]
    Embedding(#[source] BoxError),
    /// Every sense was excluded because its definition was empty or could not
    /// be embedded.
    #[error("no sense definition could be embedded ({excluded} excluded)")]
    NoUsableSenses { excluded: usize },
    /// The vectors could not be aggregated or compared.
    #[error("degenerate vector: {0}")]
    Vector(#[from] VectorError),
    /// The token exceeded its time budget.
    #[error("timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },
    /// The call was cancelled before this token finished.
    #[error("cancelled")]
    Cancelled,
    /// No thread could be started for a collaborator call.
    #[error("failed to start collaborator call: {0}")]
    Spawn(#[source] std::io::Error),
    /// The collaborator panicked before answering.
    #[error("collaborator call aborted without an answer")]
    Aborted,
}
