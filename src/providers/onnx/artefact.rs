use std::{fs::File, io, path::PathBuf};

use sha2::{Digest, Sha256};

use super::errors::OnnxEmbeddingError;

/// Model or tokenizer file pinned to a recorded SHA-256 digest.
///
/// Embeddings from a different model version would silently move every
/// similarity score, so artefacts are verified before they are loaded.
#[derive(Debug, Clone)]
pub struct OnnxArtefact {
    pub path: PathBuf,
    /// Expected digest as hexadecimal; case and surrounding whitespace are ignored.
    pub sha256: String,
}

impl OnnxArtefact {
    /// Hash the file and compare it with the recorded digest.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the file cannot be read and `ChecksumMismatch` when
    /// the digests differ.
    pub fn verify(&self) -> Result<(), OnnxEmbeddingError> {
        let io_error = |source| OnnxEmbeddingError::Io {
            path: self.path.clone(),
            source,
        };
        let mut file = File::open(&self.path).map_err(io_error)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(io_error)?;
        let actual = format!("{:x}", hasher.finalize());
        let expected = self.sha256.trim().to_ascii_lowercase();
        if actual == expected {
            Ok(())
        } else {
            Err(OnnxEmbeddingError::ChecksumMismatch {
                path: self.path.clone(),
                expected,
                actual,
            })
        }
    }
}
