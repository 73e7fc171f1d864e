//! CLI argument types, layered configuration, and the run loop for the
//! `lexamb` binary.
//!
//! Loads from CLI args, environment (prefix `LEXAMB_`), and an optional TOML
//! config file, then wires the annotation service, lexical resource, and
//! embedding API into an [`AmbiguityScorer`].

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use ortho_config::OrthoError;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::{
    ApiEmbedding, ApiLexicon, CachedProcessor, CancellationToken, HttpTransport, JsonLexicon,
    Lexicon, LexiconError, TeprolinClient,
    api::AmbiguityReport,
    config::{ConfigError, DEFAULT_THRESHOLD, RetryPolicy, ScorerConfig, Threshold},
    errors::DetectionError,
    scorer::AmbiguityScorer,
    teprolin::DEFAULT_BASE_URL,
    transport::DEFAULT_REQUEST_TIMEOUT,
};

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Errors that stop the `lexamb` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Transport(#[source] reqwest::Error),
    #[error(transparent)]
    Lexicon(#[from] LexiconError),
    #[error("no lexical resource configured; set --lexicon-path or --lexicon-url")]
    MissingLexicon,
    #[error("no embedding endpoint configured; set --embedding-url")]
    MissingEmbeddingUrl,
    #[error("failed to read text from stdin: {0}")]
    Stdin(#[source] std::io::Error),
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("failed to render report: {0}")]
    Render(#[source] serde_json::Error),
}

/// Command-line arguments for the `lexamb` binary.
///
/// Configuration values are loaded from command line arguments, environment
/// variables (prefixed with `LEXAMB_`), and an optional configuration file.
///
/// # Examples
///
/// Parse flags directly:
/// ```
/// use lexical_ambiguity::cli::LexambArgs;
/// use ortho_config::OrthoConfig;
///
/// let args = LexambArgs::load_from_iter(["lexamb", "--threshold=0.5"])
///     .expect("load args from CLI iterator");
/// assert_eq!(args.threshold, 0.5);
/// ```
///
/// Load from a configuration file:
/// ```
/// use lexical_ambiguity::cli::LexambArgs;
/// use ortho_config::OrthoConfig;
/// use std::io::Write;
/// use tempfile::NamedTempFile;
///
/// let mut file = NamedTempFile::new().expect("create temp file");
/// writeln!(file, "workers = 2").expect("write config");
/// let path = file.path().to_str().expect("path str");
/// let args = LexambArgs::load_from_iter(["lexamb", "--config-path", path])
///     .expect("load args from config path");
/// assert_eq!(args.workers, 2);
/// ```
#[derive(Debug, Deserialize, ortho_config::OrthoConfig)]
#[ortho_config(prefix = "LEXAMB")]
pub struct LexambArgs {
    /// Text to analyse. Read from stdin when absent.
    #[serde(default)]
    pub text: Option<String>,

    /// Flag words whose similarity falls below this value.
    #[ortho_config(default = 0.8)]
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Base URL of the text annotation service.
    #[serde(default)]
    pub tokenizer_url: Option<String>,

    /// Endpoint of the embedding API.
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Bearer token for the embedding API.
    #[serde(default)]
    pub embedding_api_key: Option<String>,

    /// JSON lexicon file mapping literals to senses.
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,

    /// Endpoint of a remote lexical resource. Ignored when a lexicon file is set.
    #[serde(default)]
    pub lexicon_url: Option<String>,

    /// Tokens evaluated concurrently.
    #[ortho_config(default = 4)]
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Time budget per token in milliseconds.
    #[ortho_config(default = 30_000)]
    #[serde(default = "default_token_timeout_ms")]
    pub token_timeout_ms: u64,

    /// Timeout for each HTTP request in milliseconds.
    #[ortho_config(default = 10_000)]
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Attempts per HTTP request, including the first.
    #[ortho_config(default = 3)]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between HTTP attempts in milliseconds.
    #[ortho_config(default = 250)]
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Print the full report as JSON instead of one word per line.
    #[ortho_config(default = false)]
    #[serde(default)]
    pub json: bool,

    /// Log filter in `RUST_LOG` syntax.
    #[serde(default)]
    pub log_level: Option<String>,

    /// Optional path to a configuration file.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_workers() -> usize {
    ScorerConfig::default().workers
}

fn default_token_timeout_ms() -> u64 {
    ScorerConfig::default().token_timeout_ms
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "default timeout is a few seconds"
)]
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_millis() as u64
}

fn default_max_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

fn default_retry_backoff_ms() -> u64 {
    RetryPolicy::default().backoff_ms
}

impl LexambArgs {
    /// Load configuration solely from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if any variable cannot be parsed.
    pub fn load_from_env() -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Env::prefixed("LEXAMB_"))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if the file cannot be read or parsed.
    pub fn load_from_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(Into::into)
    }

    /// Load configuration from environment variables and a file path.
    ///
    /// # Errors
    ///
    /// Returns an [`OrthoError`] if either source contains invalid values.
    pub fn load_from_env_and_config(path: &str) -> Result<Self, OrthoError> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LEXAMB_"))
            .extract()
            .map_err(Into::into)
    }

    /// Worker and timeout limits for the scorer.
    #[must_use]
    pub fn scorer_config(&self) -> ScorerConfig {
        ScorerConfig {
            workers: self.workers,
            token_timeout_ms: self.token_timeout_ms,
        }
    }

    /// Retry policy applied to every HTTP collaborator.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_ms: self.retry_backoff_ms,
        }
    }

    /// Log filter directives, defaulting to `warn`.
    #[must_use]
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    fn lexicon(&self, transport: &HttpTransport) -> Result<Lexicon, CliError> {
        match (&self.lexicon_path, &self.lexicon_url) {
            (Some(path), _) => Ok(Lexicon::File(JsonLexicon::from_path(path)?)),
            (None, Some(url)) => Ok(Lexicon::Api(ApiLexicon::with_transport(
                url.clone(),
                transport.clone(),
            ))),
            (None, None) => Err(CliError::MissingLexicon),
        }
    }

    fn embedder(&self, transport: &HttpTransport) -> Result<ApiEmbedding, CliError> {
        let url = self
            .embedding_url
            .clone()
            .ok_or(CliError::MissingEmbeddingUrl)?;
        Ok(ApiEmbedding::with_transport(
            url,
            self.embedding_api_key.clone(),
            transport.clone(),
        ))
    }

    fn read_text(&self) -> Result<String, CliError> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(CliError::Stdin)?;
        Ok(text)
    }
}

/// Build the collaborators described by `args` and run one detection.
///
/// The threshold and limits are validated before any service is contacted.
///
/// # Errors
///
/// Returns a [`CliError`] when configuration is invalid or incomplete, the
/// lexicon cannot be loaded, stdin cannot be read, or tokenization fails.
pub fn run(args: &LexambArgs, cancel: &CancellationToken) -> Result<AmbiguityReport, CliError> {
    let threshold = Threshold::new(args.threshold)?;
    let scorer_config = args.scorer_config().validate()?;
    let retry = args.retry_policy().validate()?;

    let transport = HttpTransport::new(Duration::from_millis(args.request_timeout_ms), retry)
        .map_err(CliError::Transport)?;
    let tokenizer = TeprolinClient::with_transport(
        args.tokenizer_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        transport.clone(),
    );
    let lexicon = args.lexicon(&transport)?;
    let embedder = CachedProcessor::new(args.embedder(&transport)?);

    let scorer = AmbiguityScorer::new(tokenizer, lexicon, embedder, scorer_config)?;
    let text = args.read_text()?;
    Ok(scorer.detect(&text, threshold.get(), cancel)?)
}

/// Render a report as one flagged word per line, or as pretty JSON.
///
/// # Errors
///
/// Returns [`CliError::Render`] if JSON serialisation fails.
pub fn render(report: &AmbiguityReport, json: bool) -> Result<String, CliError> {
    if json {
        serde_json::to_string_pretty(report).map_err(CliError::Render)
    } else {
        Ok(report.ambiguous_words().join("\n"))
    }
}
