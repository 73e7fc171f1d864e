//! Blocking HTTP transport shared by every remote collaborator.
//!
//! Applies one request timeout and one [`RetryPolicy`] to the tokenizer, the
//! lexical resource, and the embedding API, so a slow or flaky service is
//! handled the same way wherever it sits in the pipeline.
//!
//! When the scorer runs a collaborator under a token budget, each request is
//! shortened to the time left and no retry is started that would outlive it.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use tracing::warn;

use crate::cancel::CallScope;
use crate::config::RetryPolicy;

/// Request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Floor for a request whose caller has already stopped waiting.
const SPENT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1);

/// HTTP client plus the retry policy applied to each request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport with the given per-request timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            timeout,
            retry,
        })
    }

    /// Send the request produced by `build`, retrying transient failures.
    ///
    /// Connection errors, timeouts, and 5xx responses are retried up to the
    /// policy's attempt limit. Any other failure, including 4xx responses, is
    /// returned immediately. Inside a scorer call budget, each attempt is
    /// capped at the time left and a retry whose backoff would exhaust the
    /// budget is not started.
    ///
    /// # Errors
    ///
    /// Returns the last transport or status error once attempts are exhausted.
    pub fn send<F>(&self, build: F) -> Result<Response, reqwest::Error>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let scope = CallScope::current();
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let timeout = match &scope {
                Some(scope) => scope
                    .remaining()
                    .map_or(SPENT_REQUEST_TIMEOUT, |left| left.min(self.timeout)),
                None => self.timeout,
            };
            let result = build(&self.client)
                .timeout(timeout)
                .send()
                .and_then(Response::error_for_status);
            match result {
                Err(err)
                    if attempt < attempts
                        && is_transient(&err)
                        && budget_allows(scope.as_ref(), self.retry.delay_after(attempt)) =>
                {
                    let delay = self.retry.delay_after(attempt);
                    warn!(attempt, error = %err, ?delay, "retrying request");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        #[expect(
            clippy::expect_used,
            reason = "client builder should not fail with defaults"
        )]
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .expect("client builder failed with default configuration");
        Self {
            client,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

fn budget_allows(scope: Option<&CallScope>, delay: Duration) -> bool {
    scope.is_none_or(|scope| scope.remaining().is_some_and(|left| left > delay))
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err.status().is_some_and(|status| status.is_server_error())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use httpmock::{Method::GET, MockServer};
    use rstest::rstest;
    use std::time::Instant;

    #[rstest]
    fn retries_server_errors_until_exhausted() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });
        let transport = HttpTransport::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 3,
                backoff_ms: 0,
            },
        )
        .unwrap_or_else(|e| panic!("client: {e}"));
        let url = server.url("/flaky");
        let result = transport.send(|client| client.get(&url));
        assert!(result.is_err());
        mock.assert_hits(3);
    }

    #[rstest]
    fn client_errors_are_not_retried() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });
        let transport = HttpTransport::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 3,
                backoff_ms: 0,
            },
        )
        .unwrap_or_else(|e| panic!("client: {e}"));
        let url = server.url("/missing");
        let result = transport.send(|client| client.get(&url));
        assert!(result.is_err());
        mock.assert_hits(1);
    }

    #[rstest]
    fn retries_stop_when_backoff_outlives_the_call_budget() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });
        let transport = HttpTransport::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 3,
                backoff_ms: 5_000,
            },
        )
        .unwrap_or_else(|e| panic!("client: {e}"));
        let url = server.url("/flaky");
        let scope = CallScope::new(
            Instant::now() + Duration::from_secs(1),
            CancellationToken::new(),
        );
        let started = Instant::now();
        let result = scope.run(|| transport.send(|client| client.get(&url)));
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
        mock.assert_hits(1);
    }

    #[rstest]
    fn cancelled_scope_does_not_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });
        let transport = HttpTransport::new(
            Duration::from_secs(2),
            RetryPolicy {
                max_attempts: 3,
                backoff_ms: 0,
            },
        )
        .unwrap_or_else(|e| panic!("client: {e}"));
        let url = server.url("/flaky");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let scope = CallScope::new(Instant::now() + Duration::from_secs(60), cancel);
        let result = scope.run(|| transport.send(|client| client.get(&url)));
        assert!(result.is_err());
        assert!(mock.hits() <= 1);
    }
}
