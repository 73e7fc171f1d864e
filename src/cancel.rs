//! Cooperative cancellation for in-flight scoring calls.

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Shared flag that asks an in-flight scoring call to stop.
///
/// Clones observe the same flag, so a signal handler can hold one clone while
/// the scorer polls another. Token evaluations check the flag before every
/// collaborator call.
///
/// # Examples
///
/// ```
/// use lexical_ambiguity::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Time budget for one token evaluation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub(crate) fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub(crate) fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub(crate) fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    pub(crate) fn expires_at(&self) -> Instant {
        self.started + self.budget
    }
}

thread_local! {
    static CALL_SCOPE: RefCell<Option<CallScope>> = const { RefCell::new(None) };
}

/// Budget and cancellation visible to a collaborator call running on its own
/// thread.
///
/// The scorer installs a scope before invoking a collaborator so that code
/// deep inside it, such as the HTTP retry loop, can stop early once nobody is
/// waiting for the answer.
#[derive(Debug, Clone)]
pub(crate) struct CallScope {
    expires_at: Instant,
    cancel: CancellationToken,
}

impl CallScope {
    pub(crate) fn new(expires_at: Instant, cancel: CancellationToken) -> Self {
        Self { expires_at, cancel }
    }

    /// Install this scope on the current thread for the duration of `f`.
    pub(crate) fn run<R>(self, f: impl FnOnce() -> R) -> R {
        let previous = CALL_SCOPE.with(|slot| slot.replace(Some(self)));
        let result = f();
        CALL_SCOPE.with(|slot| *slot.borrow_mut() = previous);
        result
    }

    /// The scope installed on the current thread, if any.
    pub(crate) fn current() -> Option<Self> {
        CALL_SCOPE.with(|slot| slot.borrow().clone())
    }

    /// Time left before the caller stops waiting, or `None` once the budget
    /// is spent or the call was cancelled.
    pub(crate) fn remaining(&self) -> Option<Duration> {
        if self.cancel.is_cancelled() {
            return None;
        }
        self.expires_at
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }
}
