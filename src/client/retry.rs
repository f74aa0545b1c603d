//! Retry with exponential backoff for DOI lookups.
//!
//! doi.org and the publisher landing pages behind it fail transiently often
//! enough that a small number of retries is worth it. Only transport errors and
//! the gateway-style statuses 500, 502 and 504 are retried; everything else is
//! handed back to the caller untouched.

use std::time::Duration;

use rand::Rng;
use reqwest::{RequestBuilder, Response};
use tracing::{debug, instrument, warn};

use super::ClientError;

/// Default maximum attempts (including the first one).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const MAX_JITTER: Duration = Duration::from_millis(100);

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on retry (connect errors, timeouts, 500/502/504).
    Transient,
    /// Retrying will not help.
    Permanent,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after `delay`; `attempt` is the upcoming attempt number.
    Retry { delay: Duration, attempt: u32 },
    /// Give up.
    DoNotRetry { reason: String },
}

/// Exponential backoff configuration.
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt budget (at least 1).
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether the attempt that just failed (1-indexed) should be retried.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.calculate_delay(attempt),
            attempt: attempt + 1,
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        let jitter_ms = rand::thread_rng().gen_range(0..=MAX_JITTER.as_millis() as u64);
        Duration::from_millis(capped_ms as u64) + Duration::from_millis(jitter_ms)
    }
}

/// Classifies an HTTP status for retry purposes.
#[must_use]
pub fn classify_status(status: u16) -> FailureType {
    match status {
        500 | 502 | 504 => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a transport error for retry purposes.
#[must_use]
pub fn classify_transport(error: &reqwest::Error) -> FailureType {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        FailureType::Transient
    } else {
        FailureType::Permanent
    }
}

/// Sends the request produced by `build` until it succeeds or the policy gives up.
///
/// The final response is returned even when its status is a retryable one, so
/// callers keep full control over status handling.
///
/// # Errors
///
/// Returns [`ClientError::Network`] when the last attempt failed at transport level.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    url: &str,
    build: F,
) -> Result<Response, ClientError>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 1;
    loop {
        let failure = match build().send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match policy.should_retry(classify_status(status), attempt) {
                    RetryDecision::Retry { delay, attempt: next } => {
                        debug!(url, status, next_attempt = next, "retrying after server error");
                        tokio::time::sleep(delay).await;
                        attempt = next;
                        continue;
                    }
                    RetryDecision::DoNotRetry { .. } => return Ok(response),
                }
            }
            Err(error) => error,
        };

        match policy.should_retry(classify_transport(&failure), attempt) {
            RetryDecision::Retry { delay, attempt: next } => {
                warn!(url, error = %failure, next_attempt = next, "request failed, retrying");
                tokio::time::sleep(delay).await;
                attempt = next;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(url, %reason, "giving up");
                return Err(ClientError::network(url, failure));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_gateway_errors_are_transient() {
        assert_eq!(classify_status(500), FailureType::Transient);
        assert_eq!(classify_status(502), FailureType::Transient);
        assert_eq!(classify_status(504), FailureType::Transient);
    }

    #[test]
    fn test_classify_status_other_codes_are_permanent() {
        for status in [200, 302, 400, 404, 503] {
            assert_eq!(classify_status(status), FailureType::Permanent, "{status}");
        }
    }

    #[test]
    fn test_should_retry_permanent_never_retries() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.should_retry(FailureType::Permanent, 1),
            RetryDecision::DoNotRetry { .. }
        ));
    }

    #[test]
    fn test_should_retry_transient_until_budget_exhausted() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 1),
            RetryDecision::Retry { attempt: 2, .. }
        ));
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 2),
            RetryDecision::Retry { attempt: 3, .. }
        ));
        match policy.should_retry(FailureType::Transient, 3) {
            RetryDecision::DoNotRetry { reason } => assert!(reason.contains("exhausted")),
            RetryDecision::Retry { .. } => panic!("third failure must not be retried"),
        }
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = RetryPolicy::default();
        let first = policy.calculate_delay(1);
        let second = policy.calculate_delay(2);
        assert!(first >= DEFAULT_BASE_DELAY && first <= DEFAULT_BASE_DELAY + MAX_JITTER);
        assert!(second >= DEFAULT_BASE_DELAY * 2);
        assert!(policy.calculate_delay(30) <= DEFAULT_MAX_DELAY + MAX_JITTER);
    }

    #[test]
    fn test_with_max_attempts_floors_at_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
    }
}
