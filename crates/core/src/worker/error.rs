//! Error types for the transcode worker client.

use thiserror::Error;

/// Errors returned by a transcode worker invocation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranscodeError {
    /// The worker did not answer within the bounded wait.
    #[error("Transcode timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Could not reach the worker.
    #[error("Worker connection failed: {0}")]
    Connection(String),

    /// The worker answered with an error.
    #[error("Worker rejected job (HTTP {status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// The worker answered with something we could not parse.
    #[error("Invalid worker response: {reason}")]
    InvalidResponse { reason: String },
}

impl TranscodeError {
    /// Creates a new rejected error.
    pub fn rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            reason: reason.into(),
        }
    }

    /// Creates a new invalid response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection(_) => true,
            Self::Rejected { status, .. } => *status >= 500,
            Self::InvalidResponse { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranscodeError::Timeout { timeout_ms: 120_000 };
        assert_eq!(err.to_string(), "Transcode timed out after 120000ms");

        let err = TranscodeError::rejected(422, "unreadable source");
        assert_eq!(
            err.to_string(),
            "Worker rejected job (HTTP 422): unreadable source"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(TranscodeError::Timeout { timeout_ms: 250 }.is_retryable());
        assert!(TranscodeError::Connection("refused".into()).is_retryable());
        assert!(TranscodeError::rejected(503, "busy").is_retryable());
        assert!(!TranscodeError::rejected(400, "bad request").is_retryable());
        assert!(!TranscodeError::invalid_response("not json").is_retryable());
    }
}
