//! Provider error taxonomy

use serde::Serialize;
use thiserror::Error;

/// Failure of a single provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("provider temporarily unavailable")]
    ServiceUnavailable,

    #[error("transport error (status {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("provider not configured: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Timeouts, 429 and 503 are worth another attempt; everything else moves on
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::Timeout(_) | ProviderError::RateLimited | ProviderError::ServiceUnavailable
        )
    }

    pub fn outcome(&self) -> AttemptOutcome {
        match self {
            ProviderError::Timeout(_) => AttemptOutcome::Timeout,
            ProviderError::RateLimited => AttemptOutcome::RateLimited,
            ProviderError::ServiceUnavailable => AttemptOutcome::ServiceUnavailable,
            ProviderError::Transport { .. } | ProviderError::Configuration(_) => {
                AttemptOutcome::OtherError
            }
        }
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            429 => ProviderError::RateLimited,
            503 => ProviderError::ServiceUnavailable,
            _ => ProviderError::Transport {
                status: Some(status),
                message: truncate(body, 300),
            },
        }
    }

    /// Classify a reqwest failure
    pub fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            return ProviderError::Timeout(timeout_ms);
        }
        if let Some(status) = err.status() {
            return ProviderError::from_status(status.as_u16(), &err.to_string());
        }
        ProviderError::Transport {
            status: None,
            message: err.to_string(),
        }
    }
}

/// How one provider attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Timeout,
    RateLimited,
    ServiceUnavailable,
    ParseFailure,
    OtherError,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Timeout => "timeout",
            AttemptOutcome::RateLimited => "rate_limited",
            AttemptOutcome::ServiceUnavailable => "service_unavailable",
            AttemptOutcome::ParseFailure => "parse_failure",
            AttemptOutcome::OtherError => "other_error",
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(429, AttemptOutcome::RateLimited, true)]
    #[case(503, AttemptOutcome::ServiceUnavailable, true)]
    #[case(500, AttemptOutcome::OtherError, false)]
    #[case(504, AttemptOutcome::OtherError, false)]
    #[case(400, AttemptOutcome::OtherError, false)]
    #[case(401, AttemptOutcome::OtherError, false)]
    fn test_status_classification(
        #[case] status: u16,
        #[case] outcome: AttemptOutcome,
        #[case] retryable: bool,
    ) {
        let err = ProviderError::from_status(status, "body");
        assert_eq!(err.outcome(), outcome);
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn test_timeout_is_retryable() {
        assert!(ProviderError::Timeout(1000).is_retryable());
        assert!(!ProviderError::Configuration("key".into()).is_retryable());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match ProviderError::from_status(400, &body) {
            ProviderError::Transport { message, .. } => assert!(message.len() < 310),
            other => panic!("unexpected {:?}", other),
        }
    }
}
