//! Retry and backoff for the idempotent GETs (page fetches and downloads).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Cause, DownloadError, FetchError};

/// High-level classification of a failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// Retryable server error that isn't throttling.
    Http5xx(u16),
    /// Anything else, not retried.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Exponential backoff with caps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Connection
            | ErrorKind::Throttled
            | ErrorKind::Http5xx(_) => {
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let delay = self.base_delay.saturating_mul(exp).min(self.max_delay);
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

pub fn classify(cause: &Cause) -> ErrorKind {
    match cause {
        Cause::Timeout => ErrorKind::Timeout,
        Cause::Connect(_) => ErrorKind::Connection,
        Cause::Status(code) => classify_http_status(*code),
        // Body cut short mid-transfer; the GET is safe to repeat.
        Cause::Transport(_) => ErrorKind::Connection,
        Cause::Io(_) => ErrorKind::Other,
    }
}

/// Errors that carry a [`Cause`] the retry loop can classify.
pub trait Retryable: Display {
    fn cause(&self) -> &Cause;
}

impl Retryable for FetchError {
    fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl Retryable for DownloadError {
    fn cause(&self) -> &Cause {
        &self.cause
    }
}

/// Runs `op` until it succeeds or the policy says to stop, sleeping for the
/// backoff between attempts. Returns the last error on give-up.
///
/// Once `cancel` fires no new attempt is started and a pending backoff is cut
/// short; the attempt in flight still runs to completion.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => match policy.decide(attempt, classify(err.cause())) {
                RetryDecision::NoRetry => return Err(err),
                RetryDecision::RetryAfter(_) if cancel.is_cancelled() => return Err(err),
                RetryDecision::RetryAfter(delay) => {
                    debug!(attempt, ?delay, "retrying after: {err}");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(err),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
            },
        }
    }
}
