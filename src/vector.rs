//! Semantic vector utilities.
//!
//! Implements the element-wise mean used to aggregate sense definitions and
//! the cosine similarity used to compare a word against that aggregate. Both
//! accumulate in `f64` and convert back to `f32` once, so long embeddings do
//! not drift through repeated single-precision rounding.

use thiserror::Error;

/// Magnitudes below this are treated as zero.
const NEAR_ZERO: f64 = 1e-12;

/// Errors that can occur when combining or comparing vectors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VectorError {
    /// No vectors, or a zero-length vector, was supplied.
    #[error("at least one non-empty vector is required")]
    Empty,
    /// Vectors from the same embedding space disagreed on dimensionality.
    #[error("vector dimensionality mismatch: expected {expected}, found {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// One of the vectors has zero magnitude, so the angle is undefined.
    #[error("vector has zero magnitude")]
    ZeroMagnitude,
    /// A component was NaN or infinite.
    #[error("vector contains a non-finite component")]
    NonFinite,
}

/// Compute the element-wise arithmetic mean of `vectors`.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::vector::mean_vector;
///
/// let a: Box<[f32]> = vec![1.0, 0.0].into_boxed_slice();
/// let b: Box<[f32]> = vec![0.0, 1.0].into_boxed_slice();
/// let mean = mean_vector(&[a, b]).expect("same dimensionality");
/// assert_eq!(&*mean, &[0.5, 0.5]);
/// ```
///
/// # Errors
///
/// Returns [`VectorError::Empty`] when `vectors` is empty or the first vector
/// has no components, and [`VectorError::DimensionMismatch`] when any vector's
/// length differs from the first.
#[expect(
    clippy::cast_possible_truncation,
    reason = "mean accumulates in f64 then converts to f32"
)]
#[expect(clippy::cast_precision_loss, reason = "vector count fits in f64")]
pub fn mean_vector<V: AsRef<[f32]>>(vectors: &[V]) -> Result<Box<[f32]>, VectorError> {
    let first = vectors.first().ok_or(VectorError::Empty)?.as_ref();
    let dimensions = first.len();
    if dimensions == 0 {
        return Err(VectorError::Empty);
    }

    let mut sums = vec![0.0f64; dimensions];
    for vector in vectors {
        let vector = vector.as_ref();
        if vector.len() != dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: dimensions,
                actual: vector.len(),
            });
        }
        #[expect(clippy::float_arithmetic, reason = "mean accumulation")]
        for (sum, &component) in sums.iter_mut().zip(vector) {
            *sum += f64::from(component);
        }
    }

    let count = vectors.len() as f64;
    #[expect(clippy::float_arithmetic, reason = "final division")]
    let mean = sums.into_iter().map(|sum| (sum / count) as f32).collect();
    Ok(mean)
}

/// Cosine of the angle between `a` and `b`, clamped to `[-1, 1]`.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::vector::cosine_similarity;
///
/// let similarity = cosine_similarity(&[1.0, 0.0], &[1.0, 1.0]).expect("valid vectors");
/// assert!((similarity - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
/// ```
///
/// # Errors
///
/// Returns [`VectorError::Empty`] for zero-length input,
/// [`VectorError::DimensionMismatch`] when the lengths differ,
/// [`VectorError::NonFinite`] when a component is NaN or infinite, and
/// [`VectorError::ZeroMagnitude`] when either vector is all zeros.
#[expect(
    clippy::cast_possible_truncation,
    reason = "similarity accumulates in f64 then converts to f32"
)]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, VectorError> {
    if a.is_empty() || b.is_empty() {
        return Err(VectorError::Empty);
    }
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    if !a.iter().chain(b).all(|v| v.is_finite()) {
        return Err(VectorError::NonFinite);
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    #[expect(clippy::float_arithmetic, reason = "dot product accumulation")]
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let (norm_a, norm_b) = (norm_a.sqrt(), norm_b.sqrt());
    if norm_a < NEAR_ZERO || norm_b < NEAR_ZERO {
        return Err(VectorError::ZeroMagnitude);
    }
    #[expect(clippy::float_arithmetic, reason = "normalising the dot product")]
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    Ok(similarity as f32)
}
