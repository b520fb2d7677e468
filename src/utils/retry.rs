//! Retry policy for outbound fetches
//!
//! Failed attempts are classified by HTTP status or transport error and mapped
//! to a linear backoff (`unit × attempt`). Rate-limit responses use a longer
//! unit than server errors.

use std::time::Duration;

use crate::config::{Config, SourceConfig};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,

    /// Backoff unit after HTTP 429
    pub rate_limited_backoff: Duration,

    /// Backoff unit after HTTP 5xx and transport errors
    pub server_error_backoff: Duration,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again
    Retry(Duration),
    /// Give up and surface the failure to the caller
    Fail,
}

/// Outcome class of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Response carried this non-success status
    Status(u16),
    /// Timeout, connection refused, reset and similar
    Transport,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limited_backoff: Duration::from_secs(10),
            server_error_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default backoff units
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Create a policy with custom backoff units
    pub fn with_backoff(
        max_attempts: u32,
        rate_limited_backoff: Duration,
        server_error_backoff: Duration,
    ) -> Self {
        Self {
            max_attempts,
            rate_limited_backoff,
            server_error_backoff,
        }
    }

    /// Build the policy for one source from the loaded configuration
    pub fn from_config(config: &Config, source: &SourceConfig) -> Self {
        Self {
            max_attempts: source.max_attempts,
            rate_limited_backoff: Duration::from_millis(config.crawler.rate_limited_backoff_ms),
            server_error_backoff: Duration::from_millis(config.crawler.server_error_backoff_ms),
        }
    }

    /// Classify a failed attempt (1-based) into retry-or-fail
    ///
    /// Non-retriable statuses fail regardless of remaining attempts. The
    /// returned delay is what the caller sleeps before the next attempt.
    pub fn decide(&self, failure: AttemptFailure, attempt: u32) -> RetryDecision {
        let unit = match failure {
            AttemptFailure::Status(code) if !Self::is_retriable_status(code) => {
                return RetryDecision::Fail
            }
            AttemptFailure::Status(429) => self.rate_limited_backoff,
            AttemptFailure::Status(_) | AttemptFailure::Transport => self.server_error_backoff,
        };

        RetryDecision::Retry(unit * attempt)
    }

    /// Whether a status code is worth retrying at all
    pub fn is_retriable_status(status: u16) -> bool {
        status == 429 || status >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_backoff_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(AttemptFailure::Status(429), 1),
            RetryDecision::Retry(Duration::from_secs(10))
        );
        assert_eq!(
            policy.decide(AttemptFailure::Status(429), 2),
            RetryDecision::Retry(Duration::from_secs(20))
        );
    }

    #[test]
    fn test_server_error_and_transport_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.decide(AttemptFailure::Status(503), 3),
            RetryDecision::Retry(Duration::from_secs(6))
        );
        assert_eq!(
            policy.decide(AttemptFailure::Transport, 1),
            RetryDecision::Retry(Duration::from_secs(2))
        );
    }

    #[test]
    fn test_client_errors_fail_immediately() {
        let policy = RetryPolicy::default();
        for status in [400, 401, 403, 404, 410] {
            assert_eq!(
                policy.decide(AttemptFailure::Status(status), 1),
                RetryDecision::Fail
            );
        }
    }

    #[test]
    fn test_is_retriable_status() {
        assert!(RetryPolicy::is_retriable_status(429));
        assert!(RetryPolicy::is_retriable_status(500));
        assert!(RetryPolicy::is_retriable_status(504));
        assert!(!RetryPolicy::is_retriable_status(404));
        assert!(!RetryPolicy::is_retriable_status(200));
    }

    #[test]
    fn test_from_config() {
        let config = Config::default();
        let policy = RetryPolicy::from_config(&config, &config.sources.linkedin);
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.rate_limited_backoff, Duration::from_secs(10));
        assert_eq!(policy.server_error_backoff, Duration::from_secs(2));
    }
}
