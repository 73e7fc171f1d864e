//! ONNX-backed sentence embedder with artefact verification.
//!
//! Runs a transformer encoder (for example a BERT checkpoint exported to
//! ONNX) and mean-pools its last hidden state over the attended tokens, which
//! yields one fixed-length vector per input string.
mod artefact;
mod config;
mod errors;

pub use artefact::OnnxArtefact;
pub use config::OnnxEmbeddingConfig;
pub use errors::OnnxEmbeddingError;

use std::sync::Mutex;

use ort::{session::Session, value::TensorRef};
use tokenizers::{
    PaddingDirection, PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection,
    TruncationParams, TruncationStrategy,
};

use crate::providers::TextProcessor;

/// Embedding provider running a local transformer encoder.
///
/// # Examples
/// ```no_run
/// use lexical_ambiguity::providers::onnx::{OnnxArtefact, OnnxEmbedding, OnnxEmbeddingConfig, OnnxEmbeddingError};
/// use lexical_ambiguity::TextProcessor;
///
/// # fn main() -> Result<(), OnnxEmbeddingError> {
/// let config = OnnxEmbeddingConfig {
///     model: OnnxArtefact {
///         path: std::path::PathBuf::from("/models/bert-base-romanian-uncased-v1.onnx"),
///         sha256: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef".into(),
///     },
///     tokenizer: OnnxArtefact {
///         path: std::path::PathBuf::from("/models/bert-base-romanian-uncased-v1.tokenizer.json"),
///         sha256: "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210".into(),
///     },
///     input_names: vec!["input_ids".into(), "attention_mask".into(), "token_type_ids".into()],
///     output_name: "last_hidden_state".into(),
///     max_sequence_length: 128,
///     pad_token: "[PAD]".into(),
///     pad_id: 0,
/// };
/// let embedder = OnnxEmbedding::new(config)?;
/// let vector = embedder.process("bancă")?;
/// # println!("{}", vector.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OnnxEmbedding {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    input_names: Vec<String>,
    output_name: String,
    max_sequence_length: usize,
}

impl OnnxEmbedding {
    /// Builds an embedder from disk artefacts.
    ///
    /// # Errors
    ///
    /// Returns [`OnnxEmbeddingError`] when artefact verification, tokenizer
    /// setup, or ONNX session creation fails.
    pub fn new(config: OnnxEmbeddingConfig) -> Result<Self, OnnxEmbeddingError> {
        if config.max_sequence_length == 0 {
            return Err(OnnxEmbeddingError::ZeroSequenceLength);
        }
        if config.input_names.len() < 2 {
            return Err(OnnxEmbeddingError::InsufficientInputNames {
                expected: 2,
                actual: config.input_names.len(),
            });
        }

        config.model.verify()?;
        config.tokenizer.verify()?;

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer.path).map_err(|source| {
            OnnxEmbeddingError::LoadTokenizer {
                path: config.tokenizer.path.clone(),
                source,
            }
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                strategy: TruncationStrategy::LongestFirst,
                stride: 0,
                direction: TruncationDirection::Right,
            }))
            .map_err(OnnxEmbeddingError::ConfigureTruncation)?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(config.max_sequence_length),
            direction: PaddingDirection::Right,
            pad_to_multiple_of: None,
            pad_id: config.pad_id,
            pad_type_id: 0,
            pad_token: config.pad_token.clone(),
        }));

        let session = Session::builder()
            .map_err(OnnxEmbeddingError::CreateSessionBuilder)?
            .commit_from_file(&config.model.path)
            .map_err(OnnxEmbeddingError::CreateSession)?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            input_names: config.input_names,
            output_name: config.output_name,
            max_sequence_length: config.max_sequence_length,
        })
    }

    fn embed(&self, input: &str) -> Result<Box<[f32]>, OnnxEmbeddingError> {
        if input.trim().is_empty() {
            return Err(OnnxEmbeddingError::Empty);
        }
        let encoding = self
            .tokenizer
            .encode(input, true)
            .map_err(OnnxEmbeddingError::Encode)?;

        let len = self.max_sequence_length;
        let ids: Vec<i64> = encoding.get_ids().iter().map(|&v| i64::from(v)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&v| i64::from(v))
            .collect();
        let type_ids: Vec<i64> = encoding
            .get_type_ids()
            .iter()
            .map(|&v| i64::from(v))
            .collect();
        for actual in [ids.len(), mask.len(), type_ids.len()] {
            if actual != len {
                return Err(OnnxEmbeddingError::SequenceLength {
                    expected: len,
                    actual,
                });
            }
        }

        let shape = [1usize, len];
        let ids_tensor = TensorRef::from_array_view((shape, ids.as_slice()))
            .map_err(OnnxEmbeddingError::EncodeTensor)?;
        let mask_tensor = TensorRef::from_array_view((shape, mask.as_slice()))
            .map_err(OnnxEmbeddingError::EncodeTensor)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| OnnxEmbeddingError::SessionPoisoned)?;

        let (ids_name, mask_name) = match (self.input_names.first(), self.input_names.get(1)) {
            (Some(ids), Some(mask)) => (ids.as_str(), mask.as_str()),
            _ => {
                return Err(OnnxEmbeddingError::InsufficientInputNames {
                    expected: 2,
                    actual: self.input_names.len(),
                });
            }
        };

        let outputs = if let Some(type_name) = self.input_names.get(2) {
            let type_tensor = TensorRef::from_array_view((shape, type_ids.as_slice()))
                .map_err(OnnxEmbeddingError::EncodeTensor)?;
            session.run(ort::inputs! {
                ids_name => ids_tensor,
                mask_name => mask_tensor,
                type_name.as_str() => type_tensor,
            })
        } else {
            session.run(ort::inputs! {
                ids_name => ids_tensor,
                mask_name => mask_tensor,
            })
        }
        .map_err(OnnxEmbeddingError::Inference)?;

        let hidden_value =
            outputs
                .get(&self.output_name)
                .ok_or_else(|| OnnxEmbeddingError::OutputMissing {
                    name: self.output_name.clone(),
                })?;
        let (_, hidden) = hidden_value
            .try_extract_tensor::<f32>()
            .map_err(OnnxEmbeddingError::Inference)?;

        masked_mean_pool(hidden, &mask)
    }
}

impl TextProcessor for OnnxEmbedding {
    type Output = Box<[f32]>;
    type Error = OnnxEmbeddingError;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        self.embed(input)
    }
}

/// Average the per-token rows of a `[tokens, dim]` hidden state, counting
/// only tokens whose attention mask is non-zero.
#[expect(
    clippy::cast_possible_truncation,
    reason = "pooling accumulates in f64 then converts to f32"
)]
#[expect(clippy::cast_precision_loss, reason = "token count fits in f64")]
fn masked_mean_pool(hidden: &[f32], mask: &[i64]) -> Result<Box<[f32]>, OnnxEmbeddingError> {
    let tokens = mask.len();
    if tokens == 0 || hidden.is_empty() || hidden.len() % tokens != 0 {
        return Err(OnnxEmbeddingError::HiddenStateShape {
            len: hidden.len(),
            tokens,
        });
    }
    let dim = hidden.len() / tokens;

    let mut sums = vec![0.0f64; dim];
    let mut attended = 0usize;
    for (row, _) in hidden
        .chunks_exact(dim)
        .zip(mask)
        .filter(|(_, flag)| **flag != 0)
    {
        attended += 1;
        #[expect(clippy::float_arithmetic, reason = "pooling accumulation")]
        for (sum, &value) in sums.iter_mut().zip(row) {
            *sum += f64::from(value);
        }
    }
    if attended == 0 {
        return Err(OnnxEmbeddingError::NoAttendedTokens);
    }

    let count = attended as f64;
    #[expect(clippy::float_arithmetic, reason = "final division")]
    let pooled = sums.into_iter().map(|sum| (sum / count) as f32).collect();
    Ok(pooled)
}
