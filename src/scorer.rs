//! Embedding-based ambiguity scorer.
//!
//! For every distinct token the scorer looks up the registered senses, embeds
//! each sense definition, averages those vectors, and compares the average to
//! the embedding of the word itself. Polysemous words whose similarity falls
//! below the threshold are flagged.
//!
//! Tokens are independent, so they are evaluated on a bounded worker pool and
//! collected back in first-occurrence order. A failure while scoring one token
//! only skips that token; only tokenization failures abort the call.
//!
//! Every collaborator call runs on its own thread while the worker waits for
//! the answer, the token deadline, or cancellation, whichever comes first. A
//! call that is still blocked when the wait ends is left to finish on its own
//! and its answer is discarded.

use std::collections::HashSet;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use tracing::{Span, debug, debug_span, info, info_span, warn};

use crate::{
    api::{AmbiguityDetector, AmbiguityReport, AmbiguityResult, SkippedToken},
    cancel::{CallScope, CancellationToken, Deadline},
    config::{ScorerConfig, Threshold},
    errors::{DetectionError, TokenFailure},
    providers::{SenseCandidate, TextProcessor},
    vector::{cosine_similarity, mean_vector},
};

/// Longest a worker sleeps before re-checking cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Flags polysemous words whose embedding drifts away from their senses.
///
/// Collaborators are injected at construction and never change afterwards.
/// They must be `'static` because a call that outlives its token budget is
/// abandoned rather than joined; share borrowed state through an [`Arc`].
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::{AmbiguityDetector, AmbiguityScorer, ScorerConfig, SenseCandidate, TextProcessor};
/// use std::convert::Infallible;
///
/// struct Words;
/// impl TextProcessor for Words {
///     type Output = Vec<String>;
///     type Error = Infallible;
///     fn process(&self, input: &str) -> Result<Vec<String>, Infallible> {
///         Ok(input.split_whitespace().map(str::to_owned).collect())
///     }
/// }
///
/// struct Senses;
/// impl TextProcessor for Senses {
///     type Output = Vec<SenseCandidate>;
///     type Error = Infallible;
///     fn process(&self, input: &str) -> Result<Vec<SenseCandidate>, Infallible> {
///         Ok(match input {
///             "bank" => vec![
///                 SenseCandidate::new("b1", "money"),
///                 SenseCandidate::new("b2", "river"),
///             ],
///             _ => Vec::new(),
///         })
///     }
/// }
///
/// struct Axes;
/// impl TextProcessor for Axes {
///     type Output = Box<[f32]>;
///     type Error = Infallible;
///     fn process(&self, input: &str) -> Result<Box<[f32]>, Infallible> {
///         let v = match input {
///             "money" | "bank" => [1.0f32, 0.0],
///             _ => [0.0, 1.0],
///         };
///         Ok(v.into())
///     }
/// }
///
/// # fn main() -> Result<(), lexical_ambiguity::DetectionError> {
/// let scorer = AmbiguityScorer::new(Words, Senses, Axes, ScorerConfig::default())?;
/// assert_eq!(scorer.find_ambiguous_words("the bank", 0.8)?, vec!["bank"]);
/// # Ok(())
/// # }
/// ```
pub struct AmbiguityScorer<T, L, E> {
    tokenizer: Arc<T>,
    lexicon: Arc<L>,
    embedder: Arc<E>,
    config: ScorerConfig,
    pool: ThreadPool,
}

enum TokenOutcome {
    Scored(AmbiguityResult),
    NotPolysemous,
    Skipped(SkippedToken),
}

impl<T, L, E> AmbiguityScorer<T, L, E>
where
    T: TextProcessor<Output = Vec<String>> + Send + Sync + 'static,
    L: TextProcessor<Output = Vec<SenseCandidate>> + Send + Sync + 'static,
    E: TextProcessor<Output = Box<[f32]>> + Send + Sync + 'static,
{
    /// Build a scorer around its three collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::Configuration`] when `config` is invalid and
    /// [`DetectionError::WorkerPool`] when the worker threads cannot start.
    pub fn new(
        tokenizer: T,
        lexicon: L,
        embedder: E,
        config: ScorerConfig,
    ) -> Result<Self, DetectionError> {
        let config = config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|index| format!("lexamb-worker-{index}"))
            .build()?;
        Ok(Self {
            tokenizer: Arc::new(tokenizer),
            lexicon: Arc::new(lexicon),
            embedder: Arc::new(embedder),
            config,
            pool,
        })
    }

    /// The validated configuration this scorer runs with.
    #[must_use]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score every distinct token of `text`, stopping early if `cancel` is
    /// tripped.
    ///
    /// A cancelled call still succeeds: the report holds whatever finished and
    /// has `cancelled` set.
    ///
    /// Tokenization is bounded by the same per-token budget as every other
    /// collaborator call.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::Configuration`] for a threshold outside
    /// `[-1, 1]` and [`DetectionError::Tokenization`] when the tokenizer fails
    /// or exceeds its budget.
    pub fn detect(
        &self,
        text: &str,
        threshold: f32,
        cancel: &CancellationToken,
    ) -> Result<AmbiguityReport, DetectionError> {
        let threshold = Threshold::new(threshold)?;
        let span = info_span!("detect", threshold = threshold.get());
        let _entered = span.enter();

        let mut report = AmbiguityReport::empty(text, threshold.get());
        if text.trim().is_empty() {
            return Ok(report);
        }
        if cancel.is_cancelled() {
            report.cancelled = true;
            return Ok(report);
        }

        let deadline = Deadline::start(self.config.token_timeout());
        let tokens = match call_bounded(&self.tokenizer, text, deadline, cancel) {
            Ok(Ok(tokens)) => tokens,
            Ok(Err(err)) => return Err(DetectionError::Tokenization(Box::new(err))),
            Err(TokenFailure::Cancelled) => {
                report.cancelled = true;
                return Ok(report);
            }
            Err(failure) => return Err(DetectionError::Tokenization(Box::new(failure))),
        };
        let words = distinct_in_order(tokens);
        debug!(distinct = words.len(), "tokenized");

        let parent = Span::current();
        let outcomes: Vec<TokenOutcome> = self.pool.install(|| {
            words
                .par_iter()
                .map(|word| parent.in_scope(|| self.evaluate(word, threshold, cancel)))
                .collect()
        });

        for outcome in outcomes {
            match outcome {
                TokenOutcome::Scored(result) => report.results.push(result),
                TokenOutcome::Skipped(skipped) => report.skipped.push(skipped),
                TokenOutcome::NotPolysemous => {}
            }
        }
        report.cancelled = cancel.is_cancelled();
        info!(
            scored = report.results.len(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled,
            "detection finished"
        );
        Ok(report)
    }

    fn evaluate(&self, word: &str, threshold: Threshold, cancel: &CancellationToken) -> TokenOutcome {
        let span = debug_span!("token", word);
        let _entered = span.enter();
        match self.score_token(word, threshold, cancel) {
            Ok(Some(result)) => TokenOutcome::Scored(result),
            Ok(None) => TokenOutcome::NotPolysemous,
            Err(failure) => {
                if !matches!(failure, TokenFailure::Cancelled) {
                    warn!(word, error = %failure, "skipping token");
                }
                TokenOutcome::Skipped(SkippedToken {
                    word: word.to_owned(),
                    reason: failure.to_string(),
                })
            }
        }
    }

    fn score_token(
        &self,
        word: &str,
        threshold: Threshold,
        cancel: &CancellationToken,
    ) -> Result<Option<AmbiguityResult>, TokenFailure> {
        let deadline = Deadline::start(self.config.token_timeout());
        checkpoint(cancel, deadline)?;

        let senses = call_bounded(&self.lexicon, word, deadline, cancel)?
            .map_err(|err| TokenFailure::LexicalResource(Box::new(err)))?;
        if senses.len() <= 1 {
            debug!(word, senses = senses.len(), "not polysemous");
            return Ok(None);
        }

        let mut vectors = Vec::with_capacity(senses.len());
        for sense in &senses {
            if sense.definition.trim().is_empty() {
                debug!(word, sense = %sense.sense_id, "sense has no definition");
                continue;
            }
            match call_bounded(&self.embedder, &sense.definition, deadline, cancel)? {
                Ok(vector) => vectors.push(vector),
                Err(err) => {
                    warn!(word, sense = %sense.sense_id, error = %err, "excluding sense");
                }
            }
        }
        if vectors.is_empty() {
            return Err(TokenFailure::NoUsableSenses {
                excluded: senses.len(),
            });
        }
        let aggregate = mean_vector(&vectors)?;

        let word_vector = call_bounded(&self.embedder, word, deadline, cancel)?
            .map_err(|err| TokenFailure::Embedding(Box::new(err)))?;

        let similarity = cosine_similarity(&word_vector, &aggregate)?;
        let result = AmbiguityResult::new(
            word,
            similarity,
            senses.len(),
            vectors.len(),
            threshold,
        );
        debug!(
            word,
            similarity,
            senses_used = result.senses_used,
            ambiguous = result.is_ambiguous,
            "scored"
        );
        Ok(Some(result))
    }
}

impl<T, L, E> AmbiguityDetector for AmbiguityScorer<T, L, E>
where
    T: TextProcessor<Output = Vec<String>> + Send + Sync + 'static,
    L: TextProcessor<Output = Vec<SenseCandidate>> + Send + Sync + 'static,
    E: TextProcessor<Output = Box<[f32]>> + Send + Sync + 'static,
{
    type Error = DetectionError;

    fn trace(&self, text: &str, threshold: f32) -> Result<AmbiguityReport, Self::Error> {
        self.detect(text, threshold, &CancellationToken::new())
    }
}

fn checkpoint(cancel: &CancellationToken, deadline: Deadline) -> Result<(), TokenFailure> {
    if cancel.is_cancelled() {
        Err(TokenFailure::Cancelled)
    } else if deadline.expired() {
        Err(TokenFailure::Timeout {
            elapsed: deadline.elapsed(),
        })
    } else {
        Ok(())
    }
}

/// Run one collaborator call on its own thread and wait for it until the
/// deadline passes or `cancel` trips.
///
/// The outer `Result` reports why the wait ended early; the inner one is the
/// collaborator's own answer.
fn call_bounded<P>(
    processor: &Arc<P>,
    input: &str,
    deadline: Deadline,
    cancel: &CancellationToken,
) -> Result<Result<P::Output, P::Error>, TokenFailure>
where
    P: TextProcessor + Send + Sync + 'static,
{
    checkpoint(cancel, deadline)?;
    let (sender, receiver) = mpsc::sync_channel(1);
    let processor = Arc::clone(processor);
    let owned = input.to_owned();
    let scope = CallScope::new(deadline.expires_at(), cancel.clone());
    let span = Span::current();
    thread::Builder::new()
        .name("lexamb-call".into())
        .spawn(move || {
            let answer = span.in_scope(|| scope.run(|| processor.process(&owned)));
            if sender.send(answer).is_err() {
                debug!("discarding answer of an abandoned call");
            }
        })
        .map_err(TokenFailure::Spawn)?;

    loop {
        match receiver.recv_timeout(deadline.remaining().min(POLL_INTERVAL)) {
            Ok(answer) => return Ok(answer),
            Err(mpsc::RecvTimeoutError::Timeout) => checkpoint(cancel, deadline)?,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Err(TokenFailure::Aborted),
        }
    }
}

/// Drop repeated surface forms, keeping the first occurrence of each.
fn distinct_in_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
