//! Classify producer errors into retry policy error kinds.

use super::hint::{self, RetryHint};
use super::policy::{ErrorKind, RetryConfig};

/// What the retry core needs to know about a producer error.
///
/// Header names are looked up in lowercase. Errors that carry a rate-limit
/// signal outside the status code (e.g. an in-band stream error event) can
/// override [`RetryableError::signals_rate_limit`].
pub trait RetryableError: std::error::Error {
    /// HTTP-like status code, if the error carries one.
    fn status(&self) -> Option<u16>;

    /// Header-like metadata field by lowercase name.
    fn header(&self, name: &str) -> Option<&str>;

    /// Provider-specific "too many requests" signal.
    fn signals_rate_limit(&self) -> bool {
        false
    }
}

/// Classification of one error; derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub retry_hint: Option<RetryHint>,
}

/// Classify an error against the configured rate-limit statuses.
pub fn classify<E>(error: &E, config: &RetryConfig) -> ClassifiedError
where
    E: RetryableError + ?Sized,
{
    let by_status = error
        .status()
        .map(|code| config.is_rate_limit_status(code))
        .unwrap_or(false);
    let kind = if by_status || error.signals_rate_limit() {
        ErrorKind::RateLimited
    } else {
        ErrorKind::Other
    };
    ClassifiedError {
        kind,
        retry_hint: hint::retry_hint(error),
    }
}
