//! Lexical resources that map a literal wordform to its registered senses.
//!
//! [`JsonLexicon`] serves senses from a JSON export of a wordnet, keyed by
//! literal. [`ApiLexicon`] asks a remote wordnet service. [`Lexicon`] lets a
//! caller choose between them at runtime while the scorer sees one type.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::providers::{SenseCandidate, TextProcessor};

/// Errors produced while loading or querying a lexical resource.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lexicon at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(feature = "provider-api")]
    #[error(transparent)]
    Api(#[from] ApiLexiconError),
}

impl From<Infallible> for LexiconError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// In-memory lexicon loaded from a JSON object of the form
/// `{ "literal": [{ "id": "...", "definition": "..." }, ...] }`.
///
/// Lookups try the literal as written, then its lowercase form, so a
/// sentence-initial capital still finds the dictionary entry.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::{JsonLexicon, TextProcessor};
///
/// let lexicon = JsonLexicon::from_json(r#"{
///     "bancă": [
///         { "id": "s1", "definition": "instituție financiară" },
///         { "id": "s2", "definition": "scaun lung" }
///     ]
/// }"#).expect("valid lexicon");
/// assert_eq!(lexicon.process("Bancă").map(|s| s.len()), Ok(2));
/// assert_eq!(lexicon.process("necunoscut"), Ok(Vec::new()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonLexicon {
    entries: HashMap<String, Vec<SenseCandidate>>,
}

impl JsonLexicon {
    /// Load a lexicon from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LexiconError::Io`] if the file cannot be read and
    /// [`LexiconError::Parse`] if it is not a valid lexicon document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| LexiconError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a lexicon from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid lexicon document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Self::parse(json)
    }

    fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(|entries| Self { entries })
    }

    /// Number of literals with at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lexicon has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, literal: &str) -> Vec<SenseCandidate> {
        self.entries
            .get(literal)
            .or_else(|| self.entries.get(&literal.to_lowercase()))
            .cloned()
            .unwrap_or_default()
    }
}

impl FromIterator<(String, Vec<SenseCandidate>)> for JsonLexicon {
    fn from_iter<I: IntoIterator<Item = (String, Vec<SenseCandidate>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl TextProcessor for JsonLexicon {
    type Output = Vec<SenseCandidate>;
    type Error = Infallible;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        Ok(self.lookup(input))
    }
}

#[cfg(feature = "provider-api")]
pub use api::{ApiLexicon, ApiLexiconError};

#[cfg(feature = "provider-api")]
mod api {
    use serde::Deserialize;
    use thiserror::Error;

    use crate::providers::{SenseCandidate, TextProcessor};
    use crate::transport::HttpTransport;

    /// Errors returned by [`ApiLexicon`].
    #[derive(Debug, Error)]
    pub enum ApiLexiconError {
        #[error("lexicon request failed: {0}")]
        Request(#[from] reqwest::Error),
        #[error("invalid lexicon response: {0}")]
        InvalidResponse(#[source] reqwest::Error),
    }

    #[derive(Deserialize)]
    struct SensesResponse {
        #[serde(default)]
        senses: Vec<SenseCandidate>,
    }

    /// Lexical resource served over HTTP.
    ///
    /// Posts `{"literal": word}` and expects `{"senses": [{"id", "definition"}]}`.
    /// Unknown words answer with an empty list rather than an error status.
    #[derive(Debug, Clone)]
    pub struct ApiLexicon {
        transport: HttpTransport,
        url: String,
    }

    impl ApiLexicon {
        /// Create a lexicon client for `url` using the default transport.
        #[must_use]
        pub fn new(url: impl Into<String>) -> Self {
            Self::with_transport(url, HttpTransport::default())
        }

        /// Create a lexicon client that sends requests through `transport`.
        #[must_use]
        pub fn with_transport(url: impl Into<String>, transport: HttpTransport) -> Self {
            Self {
                transport,
                url: url.into(),
            }
        }
    }

    impl TextProcessor for ApiLexicon {
        type Output = Vec<SenseCandidate>;
        type Error = ApiLexiconError;

        fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
            let body = serde_json::json!({ "literal": input });
            let response = self
                .transport
                .send(|client| client.post(&self.url).json(&body))?;
            let parsed: SensesResponse =
                response.json().map_err(ApiLexiconError::InvalidResponse)?;
            Ok(parsed.senses)
        }
    }
}

/// A lexical resource chosen at runtime.
#[derive(Debug, Clone)]
pub enum Lexicon {
    File(JsonLexicon),
    #[cfg(feature = "provider-api")]
    Api(ApiLexicon),
}

impl TextProcessor for Lexicon {
    type Output = Vec<SenseCandidate>;
    type Error = LexiconError;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        match self {
            Self::File(lexicon) => Ok(lexicon.process(input)?),
            #[cfg(feature = "provider-api")]
            Self::Api(lexicon) => Ok(lexicon.process(input)?),
        }
    }
}
