//! Core library entry point.
//!
//! Flags words that are polysemous in a lexical resource and whose embedding
//! sits far from the mean embedding of their sense definitions. Re-exports
//! the scorer, its collaborator seams, and the bundled providers.

pub mod api;
#[cfg(feature = "provider-api")]
pub mod api_embedding;
pub mod cancel;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod lexicon;
#[cfg(feature = "cli")]
pub mod logging;
pub mod providers;
pub mod scorer;
#[cfg(feature = "provider-api")]
pub mod teprolin;
#[cfg(feature = "provider-api")]
pub mod transport;
pub mod vector;

pub use api::{AmbiguityDetector, AmbiguityReport, AmbiguityResult, SkippedToken};
#[cfg(feature = "provider-api")]
pub use api_embedding::{ApiEmbedding, ApiEmbeddingError};
pub use cancel::CancellationToken;
#[cfg(feature = "cli")]
pub use cli::LexambArgs;
pub use config::{ConfigError, DEFAULT_THRESHOLD, RetryPolicy, ScorerConfig, Threshold};
pub use errors::{BoxError, DetectionError, TokenFailure};
#[cfg(feature = "provider-api")]
pub use lexicon::{ApiLexicon, ApiLexiconError};
pub use lexicon::{JsonLexicon, Lexicon, LexiconError};
pub use providers::{
    CachedProcessor, EmbeddingProvider, LexicalResource, SenseCandidate, TextProcessor,
    TextTokenizer,
};
pub use scorer::AmbiguityScorer;
#[cfg(feature = "provider-api")]
pub use teprolin::{AnnotatedToken, AnnotationTask, Dependency, TeprolinClient, TeprolinError};
#[cfg(feature = "provider-api")]
pub use transport::HttpTransport;
pub use vector::VectorError;
