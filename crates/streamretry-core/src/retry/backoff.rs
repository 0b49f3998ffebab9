//! Backoff delay: exponential by default, overridden by server hints.

use std::time::{Duration, SystemTime};

use super::classify::RetryableError;
use super::hint::{self, RetryHint};
use super::policy::RetryConfig;

/// `min(max_delay, base_delay * 2^attempt_index)`, saturating.
pub fn exponential_delay(attempt_index: u32, config: &RetryConfig) -> Duration {
    let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
    config
        .base_delay
        .saturating_mul(factor)
        .min(config.max_delay)
}

/// Delay before the attempt after `attempt_index`, using the system clock to
/// resolve timestamp hints.
pub fn compute_delay<E>(error: &E, attempt_index: u32, config: &RetryConfig) -> Duration
where
    E: RetryableError + ?Sized,
{
    compute_delay_at(error, attempt_index, config, SystemTime::now())
}

/// Same as [`compute_delay`] with an explicit "now".
///
/// A parsed hint replaces the exponential value entirely and is not clamped
/// to `max_delay`.
pub fn compute_delay_at<E>(
    error: &E,
    attempt_index: u32,
    config: &RetryConfig,
    now: SystemTime,
) -> Duration
where
    E: RetryableError + ?Sized,
{
    delay_from_hint(hint::retry_hint(error), attempt_index, config, now)
}

/// Delay for an already-parsed hint, falling back to exponential backoff.
pub fn delay_from_hint(
    hint: Option<RetryHint>,
    attempt_index: u32,
    config: &RetryConfig,
    now: SystemTime,
) -> Duration {
    match hint {
        Some(h) => h.delay_at(now),
        None => exponential_delay(attempt_index, config),
    }
}
