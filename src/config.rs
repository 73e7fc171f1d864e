//! Scorer configuration types, threshold validation, and transport policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Similarity threshold applied when the caller does not override it.
pub const DEFAULT_THRESHOLD: f32 = 0.8;

/// Configuration values rejected before any collaborator is contacted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The threshold lies outside the range of cosine similarity.
    #[error("threshold {0} must lie within [-1, 1]")]
    ThresholdOutOfRange(f32),
    /// The worker pool needs at least one thread.
    #[error("workers must be greater than 0")]
    ZeroWorkers,
    /// A zero per-token timeout would skip every token.
    #[error("token_timeout_ms must be greater than 0")]
    ZeroTokenTimeout,
    /// Requests must be attempted at least once.
    #[error("max_attempts must be greater than 0")]
    ZeroAttempts,
}

/// A similarity threshold known to lie within `[-1, 1]`.
///
/// Words whose similarity to their aggregate sense vector is strictly below
/// the threshold are flagged.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::config::{Threshold, ConfigError};
///
/// assert_eq!(Threshold::default().get(), 0.8);
/// assert!(Threshold::new(0.5).is_ok());
/// assert_eq!(Threshold::new(1.5), Err(ConfigError::ThresholdOutOfRange(1.5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Threshold(f32);

impl Threshold {
    /// Validate a raw threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ThresholdOutOfRange`] when `value` is NaN or
    /// outside `[-1, 1]`.
    pub fn new(value: f32) -> Result<Self, ConfigError> {
        if (-1.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::ThresholdOutOfRange(value))
        }
    }

    /// The raw threshold value.
    #[must_use]
    pub const fn get(self) -> f32 {
        self.0
    }

    /// Whether `similarity` falls below the threshold.
    #[must_use]
    pub fn flags(self, similarity: f32) -> bool {
        similarity < self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f32> for Threshold {
    type Error = ConfigError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Threshold> for f32 {
    fn from(value: Threshold) -> Self {
        value.0
    }
}

/// Resource limits for a single scoring call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScorerConfig {
    /// Number of tokens evaluated concurrently; must be greater than zero.
    pub workers: usize,
    /// Time budget for evaluating one token, in milliseconds; must be greater
    /// than zero.
    pub token_timeout_ms: u64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            token_timeout_ms: 30_000,
        }
    }
}

impl ScorerConfig {
    /// Ensure the configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if `workers` or `token_timeout_ms` is zero.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.workers == 0 {
            Err(ConfigError::ZeroWorkers)
        } else if self.token_timeout_ms == 0 {
            Err(ConfigError::ZeroTokenTimeout)
        } else {
            Ok(self)
        }
    }

    /// Per-token time budget.
    #[must_use]
    pub const fn token_timeout(&self) -> Duration {
        Duration::from_millis(self.token_timeout_ms)
    }
}

/// Retry behaviour shared by every HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first; must be greater than
    /// zero.
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds. Attempt `n` waits
    /// `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// A policy that sends each request exactly once.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Ensure the policy is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_attempts` is zero.
    #[must_use = "Validation should not be ignored"]
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            Err(ConfigError::ZeroAttempts)
        } else {
            Ok(self)
        }
    }

    /// Delay to wait after the given 1-based failed attempt.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}
