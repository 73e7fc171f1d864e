//! Configuration for ONNX sentence embedders.

use super::artefact::OnnxArtefact;

/// Configuration for a transformer encoder exported to ONNX.
#[derive(Debug, Clone)]
pub struct OnnxEmbeddingConfig {
    /// Model artefact (ONNX graph) to load.
    pub model: OnnxArtefact,
    /// Tokeniser artefact consumed by `tokenizers`.
    pub tokenizer: OnnxArtefact,
    /// Ordered input names as defined in the ONNX graph: input ids, attention
    /// mask, and optionally token type ids.
    pub input_names: Vec<String>,
    /// Name of the hidden-state output to pool, usually `last_hidden_state`.
    pub output_name: String,
    /// Maximum token count accepted by the model. Inputs are padded and truncated to this size.
    /// Must be greater than zero so every encoding produces fixed-length tensors.
    pub max_sequence_length: usize,
    /// Token inserted when padding shorter sequences.
    pub pad_token: String,
    /// Identifier of the padding token.
    pub pad_id: u32,
}
