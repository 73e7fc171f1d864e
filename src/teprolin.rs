//! Client for a TEPROLIN-style text annotation service.
//!
//! Every annotation task goes through the same `POST {base_url}/process`
//! endpoint with form fields `text` and `exec`. The response nests one list
//! of annotated tokens per sentence under `teprolin-result.tokenized`.
//!
//! Tokenization backs the scorer's [`TextTokenizer`](crate::TextTokenizer)
//! seam. Tagging, entity recognition, and dependency parsing are exposed for
//! downstream pipelines that want the same service's other layers.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::providers::TextProcessor;
use crate::transport::HttpTransport;

/// Address of a locally running annotation service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const DEPENDENCY_MODEL: &str = "udpipe-ufal";

/// Errors returned by [`TeprolinClient`].
#[derive(Debug, Error)]
pub enum TeprolinError {
    /// The service could not be reached or answered with an error status.
    #[error("annotation request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The response body was not the expected JSON document.
    #[error("invalid annotation response: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

/// Annotation layers offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTask {
    Tokenization,
    PosTagging,
    NamedEntityRecognition,
    DependencyParsing,
}

impl AnnotationTask {
    /// Value of the `exec` form field selecting this task.
    #[must_use]
    pub const fn exec(self) -> &'static str {
        match self {
            Self::Tokenization => "tokenization",
            Self::PosTagging => "pos-tagging",
            Self::NamedEntityRecognition => "named-entity-recognition",
            Self::DependencyParsing => "dependency-parsing",
        }
    }

    const fn model(self) -> Option<&'static str> {
        match self {
            Self::DependencyParsing => Some(DEPENDENCY_MODEL),
            _ => None,
        }
    }
}

/// One token as annotated by the service. Layers that were not requested are
/// left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    #[serde(rename = "_wordform", default)]
    pub wordform: String,
    /// Morphosyntactic category (MSD tag).
    #[serde(rename = "_ctg", default)]
    pub ctg: String,
    #[serde(rename = "_ner", default)]
    pub ner: String,
    #[serde(rename = "_deprel", default)]
    pub deprel: String,
    /// Index of the syntactic head within the sentence.
    #[serde(rename = "_head", default, deserialize_with = "string_or_number")]
    pub head: String,
}

/// A token with its dependency relation and head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub word: String,
    pub relation: String,
    pub head: String,
}

#[derive(Deserialize)]
struct ProcessResponse {
    #[serde(rename = "teprolin-result", default)]
    result: ProcessResult,
}

#[derive(Deserialize, Default)]
struct ProcessResult {
    #[serde(default)]
    tokenized: Vec<Vec<AnnotatedToken>>,
}

/// Typed client for the annotation service.
///
/// # Examples
///
/// ```no_run
/// use lexical_ambiguity::{TeprolinClient, TextProcessor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TeprolinClient::new("http://127.0.0.1:5000");
/// let tokens = client.process("Ion și Maria merg la Călărași.")?;
/// assert_eq!(tokens.first().map(String::as_str), Some("Ion"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TeprolinClient {
    transport: HttpTransport,
    endpoint: String,
}

impl TeprolinClient {
    /// Create a client for the service at `base_url` using the default
    /// transport.
    #[must_use]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_transport(base_url, HttpTransport::default())
    }

    /// Create a client that sends requests through `transport`.
    #[must_use]
    pub fn with_transport(base_url: impl AsRef<str>, transport: HttpTransport) -> Self {
        let base = base_url.as_ref().trim_end_matches('/');
        Self {
            transport,
            endpoint: format!("{base}/process"),
        }
    }

    /// Run one annotation task and flatten the sentences into a token list.
    ///
    /// Tokens without a wordform are dropped. Blank text yields no tokens
    /// without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns [`TeprolinError::Request`] when the service is unreachable or
    /// answers with an error status and [`TeprolinError::InvalidResponse`]
    /// when the body is not valid JSON.
    pub fn annotate(
        &self,
        text: &str,
        task: AnnotationTask,
    ) -> Result<Vec<AnnotatedToken>, TeprolinError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut form = vec![("text", text), ("exec", task.exec())];
        if let Some(model) = task.model() {
            form.push(("model", model));
        }
        let response = self
            .transport
            .send(|client| client.post(&self.endpoint).form(&form))?;
        let body: ProcessResponse = response.json().map_err(TeprolinError::InvalidResponse)?;
        Ok(body
            .result
            .tokenized
            .into_iter()
            .flatten()
            .filter(|token| !token.wordform.is_empty())
            .collect())
    }

    /// Split `text` into wordforms in reading order.
    ///
    /// # Errors
    ///
    /// See [`annotate`](Self::annotate).
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, TeprolinError> {
        self.annotate(text, AnnotationTask::Tokenization)
            .map(|tokens| tokens.into_iter().map(|t| t.wordform).collect())
    }

    /// Tag pre-tokenized words with their morphosyntactic category.
    ///
    /// # Errors
    ///
    /// See [`annotate`](Self::annotate).
    pub fn pos_tags(&self, tokens: &[String]) -> Result<Vec<(String, String)>, TeprolinError> {
        self.annotate(&tokens.join(" "), AnnotationTask::PosTagging)
            .map(|tokens| tokens.into_iter().map(|t| (t.wordform, t.ctg)).collect())
    }

    /// Label pre-tokenized words with named-entity classes.
    ///
    /// # Errors
    ///
    /// See [`annotate`](Self::annotate).
    pub fn named_entities(
        &self,
        tokens: &[String],
    ) -> Result<Vec<(String, String)>, TeprolinError> {
        self.annotate(&tokens.join(" "), AnnotationTask::NamedEntityRecognition)
            .map(|tokens| tokens.into_iter().map(|t| (t.wordform, t.ner)).collect())
    }

    /// Parse `text` into dependency relations.
    ///
    /// # Errors
    ///
    /// See [`annotate`](Self::annotate).
    pub fn dependencies(&self, text: &str) -> Result<Vec<Dependency>, TeprolinError> {
        self.annotate(text, AnnotationTask::DependencyParsing)
            .map(|tokens| {
                tokens
                    .into_iter()
                    .map(|t| Dependency {
                        word: t.wordform,
                        relation: t.deprel,
                        head: t.head,
                    })
                    .collect()
            })
    }
}

impl TextProcessor for TeprolinClient {
    type Output = Vec<String>;
    type Error = TeprolinError;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.tokenize(input)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
        Raw::Null(()) => String::new(),
    })
}
