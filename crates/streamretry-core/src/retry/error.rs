//! Error type for streamed chat-completion calls.

use std::collections::BTreeMap;

use thiserror::Error;

use super::classify::RetryableError;

/// In-band stream error types that mean "slow down".
const RATE_LIMIT_EVENT_TYPES: &[&str] = &[
    "rate_limit_error",
    "overloaded_error",
    "rate_limit_exceeded",
];

/// Failure raised by a streaming API producer, either before the first chunk
/// or mid-stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Non-success HTTP response. Header names are stored lowercase.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        headers: BTreeMap<String, String>,
        message: String,
    },
    /// Error event delivered inside an otherwise successful stream.
    #[error("stream error ({error_type}): {message}")]
    StreamEvent { error_type: String, message: String },
    /// Connection dropped, body read failed, and similar.
    #[error("transport: {0}")]
    Transport(String),
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            headers: BTreeMap::new(),
            message: message.into(),
        }
    }

    pub fn stream_event(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::StreamEvent {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Attach a header to a `Status` error; ignored for other variants.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        if let ApiError::Status { headers, .. } = &mut self {
            headers.insert(name.to_ascii_lowercase(), value.into());
        }
        self
    }
}

impl RetryableError for ApiError {
    fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::StreamEvent { .. } | ApiError::Transport(_) => None,
        }
    }

    fn header(&self, name: &str) -> Option<&str> {
        match self {
            ApiError::Status { headers, .. } => headers.get(name).map(String::as_str),
            ApiError::StreamEvent { .. } | ApiError::Transport(_) => None,
        }
    }

    fn signals_rate_limit(&self) -> bool {
        match self {
            ApiError::StreamEvent { error_type, .. } => {
                RATE_LIMIT_EVENT_TYPES.contains(&error_type.as_str())
            }
            ApiError::Status { .. } | ApiError::Transport(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_normalized_to_lowercase() {
        let err = ApiError::http(429, "slow").with_header("Retry-After", "3");
        assert_eq!(err.header("retry-after"), Some("3"));
        assert_eq!(RetryableError::status(&err), Some(429));
    }

    #[test]
    fn headers_ignored_on_non_status_errors() {
        let err = ApiError::Transport("reset".into()).with_header("retry-after", "3");
        assert_eq!(err.header("retry-after"), None);
        assert_eq!(RetryableError::status(&err), None);
    }

    #[test]
    fn overloaded_event_signals_rate_limit() {
        assert!(ApiError::stream_event("overloaded_error", "busy").signals_rate_limit());
        assert!(!ApiError::stream_event("invalid_request_error", "bad").signals_rate_limit());
    }

    #[test]
    fn display_is_readable() {
        assert_eq!(ApiError::http(500, "boom").to_string(), "HTTP 500: boom");
        assert_eq!(
            ApiError::stream_event("overloaded_error", "busy").to_string(),
            "stream error (overloaded_error): busy"
        );
    }
}
