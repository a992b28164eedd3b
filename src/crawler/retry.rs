//! Retry and backoff policy for outbound requests
//!
//! The policy wraps a single transport call. It knows nothing about the HTTP
//! client: each attempt reports a status (plus an optional `Retry-After`) or a
//! transport failure, and the policy decides whether to sleep and try again.
//! Only idempotent reads are sent through it.

use crate::config::RetryConfig;
use crate::FetchCause;
use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;

/// Upper bound for any single backoff sleep
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Statuses for which a `Retry-After` header replaces the computed backoff
const RETRY_AFTER_STATUSES: [u16; 3] = [413, 429, 503];

/// Result of one transport attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// The server answered
    Response {
        status: u16,
        retry_after: Option<Duration>,
        value: T,
    },
    /// The request never produced a response
    TransportError(FetchCause),
}

/// Bounded retry with geometric backoff
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub total: u32,

    /// Backoff for retry `n` is `backoff_factor * 2^(n-1)` seconds
    pub backoff_factor: f64,

    /// Statuses that are retried
    pub status_forcelist: BTreeSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            total: config.total,
            backoff_factor: config.backoff_factor,
            status_forcelist: config.status_forcelist.iter().copied().collect(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            total: 0,
            backoff_factor: 0.0,
            status_forcelist: BTreeSet::new(),
        }
    }

    /// Returns true if a response with this status should be retried
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Computed backoff before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 || !self.backoff_factor.is_finite() || self.backoff_factor <= 0.0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(30) as i32;
        let secs = self.backoff_factor * 2f64.powi(exponent);
        Duration::from_secs_f64(secs.min(BACKOFF_MAX.as_secs_f64()))
    }

    /// Delay before retry `retry`, preferring the server's `Retry-After`
    pub fn delay_for(&self, retry: u32, status: Option<u16>, retry_after: Option<Duration>) -> Duration {
        match (status, retry_after) {
            (Some(status), Some(after)) if RETRY_AFTER_STATUSES.contains(&status) => {
                after.min(BACKOFF_MAX)
            }
            _ => self.backoff(retry),
        }
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the budget is spent
    ///
    /// A 2xx response is success. A status outside the forcelist fails
    /// immediately. Forcelisted statuses and transport errors are retried up
    /// to `total` times; the last cause is returned once retries run out.
    pub async fn run<T, F, Fut>(&self, url: &str, mut attempt: F) -> Result<T, FetchCause>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let mut retries = 0;

        loop {
            let (cause, status, retry_after) = match attempt().await {
                Attempt::Response { status, value, .. } if (200..300).contains(&status) => {
                    return Ok(value);
                }
                Attempt::Response { status, .. } if !self.is_retryable_status(status) => {
                    return Err(FetchCause::Status(status));
                }
                Attempt::Response {
                    status,
                    retry_after,
                    ..
                } => (FetchCause::Status(status), Some(status), retry_after),
                Attempt::TransportError(cause) => (cause, None, None),
            };

            if retries >= self.total {
                tracing::debug!(url, retries, %cause, "Retry budget exhausted");
                return Err(cause);
            }

            retries += 1;
            let delay = self.delay_for(retries, status, retry_after);
            tracing::debug!(
                url,
                retry = retries,
                delay_ms = delay.as_millis() as u64,
                %cause,
                "Retrying request"
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Parses a `Retry-After` value given in seconds
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
