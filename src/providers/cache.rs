//! In-process memoization for deterministic providers.

use std::collections::HashMap;
use std::sync::Mutex;

use super::TextProcessor;

/// Memoizes the successful outputs of a deterministic provider, keyed by input
/// text.
///
/// Failures are never cached, so a transient error on one call does not stick.
/// The cache lives as long as the wrapper and is never written to disk.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::{CachedProcessor, TextProcessor};
/// # use std::convert::Infallible;
/// # struct Upper;
/// # impl TextProcessor for Upper {
/// #     type Output = String;
/// #     type Error = Infallible;
/// #     fn process(&self, input: &str) -> Result<String, Infallible> {
/// #         Ok(input.to_uppercase())
/// #     }
/// # }
///
/// let cached = CachedProcessor::new(Upper);
/// assert_eq!(cached.process("ok"), Ok("OK".to_owned()));
/// assert_eq!(cached.len(), 1);
/// ```
#[derive(Debug)]
pub struct CachedProcessor<P: TextProcessor> {
    inner: P,
    entries: Mutex<HashMap<String, P::Output>>,
}

impl<P: TextProcessor> CachedProcessor<P> {
    /// Wrap `inner` with an empty cache.
    #[must_use]
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the wrapped provider.
    #[must_use]
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P> TextProcessor for CachedProcessor<P>
where
    P: TextProcessor,
    P::Output: Clone,
{
    type Output = P::Output;
    type Error = P::Error;

    fn process(&self, input: &str) -> Result<Self::Output, Self::Error> {
        // A poisoned cache only loses memoization; the provider still answers.
        if let Some(hit) = self
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(input).cloned())
        {
            return Ok(hit);
        }
        let output = self.inner.process(input)?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(input.to_owned(), output.clone());
        }
        Ok(output)
    }
}
