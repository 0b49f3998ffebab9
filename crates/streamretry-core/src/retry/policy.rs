use std::time::{Duration, SystemTime};

use super::backoff;
use super::classify::{classify, ClassifiedError, RetryableError};

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server asked us to slow down (429 or an equivalent provider signal).
    RateLimited,
    /// Any other error (only retried under `retry_all_errors`).
    Other,
}

/// Decision returned by the retry policy for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; the error goes to the caller unchanged.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Retry parameters for one wrapped call. Read-only once built, so a single
/// value can back any number of concurrent calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Backoff unit for attempt 0.
    pub base_delay: Duration,
    /// Upper bound on the exponential backoff. Server hints are not clamped.
    pub max_delay: Duration,
    /// Retry every error, not only rate limits.
    pub retry_all_errors: bool,
    /// Status codes treated as "too many requests".
    pub rate_limit_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            retry_all_errors: false,
            rate_limit_statuses: vec![429],
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_retry_all_errors(mut self, retry_all_errors: bool) -> Self {
        self.retry_all_errors = retry_all_errors;
        self
    }

    /// Adds a provider-specific status code to the rate-limit set.
    pub fn with_rate_limit_status(mut self, status: u16) -> Self {
        if !self.rate_limit_statuses.contains(&status) {
            self.rate_limit_statuses.push(status);
        }
        self
    }

    /// Attempts actually allowed. A zero config still gets its one attempt.
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn is_rate_limit_status(&self, status: u16) -> bool {
        self.rate_limit_statuses.contains(&status)
    }

    /// Evaluate and price one failed attempt in a single step.
    ///
    /// `attempt_index` is 0-based (0 = first attempt).
    pub fn decide<E>(&self, error: &E, attempt_index: u32, now: SystemTime) -> RetryDecision
    where
        E: RetryableError + ?Sized,
    {
        self.decide_classified(&classify(error, self), attempt_index, now)
    }

    /// [`RetryConfig::decide`] for an error that was already classified, so
    /// the hint is parsed once per failure.
    pub fn decide_classified(
        &self,
        classified: &ClassifiedError,
        attempt_index: u32,
        now: SystemTime,
    ) -> RetryDecision {
        if !should_retry_classified(classified, attempt_index, self) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(backoff::delay_from_hint(
            classified.retry_hint,
            attempt_index,
            self,
            now,
        ))
    }
}

/// Whether the attempt at `attempt_index` (0-based) should be followed by
/// another one.
pub fn should_retry<E>(error: &E, attempt_index: u32, config: &RetryConfig) -> bool
where
    E: RetryableError + ?Sized,
{
    should_retry_classified(&classify(error, config), attempt_index, config)
}

fn should_retry_classified(
    classified: &ClassifiedError,
    attempt_index: u32,
    config: &RetryConfig,
) -> bool {
    if attempt_index.saturating_add(1) >= config.attempt_limit() {
        return false;
    }
    match classified.kind {
        ErrorKind::RateLimited => true,
        ErrorKind::Other => config.retry_all_errors,
    }
}
