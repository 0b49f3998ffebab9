//! Server-supplied retry hints (`Retry-After` and rate-limit reset fields).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::classify::RetryableError;

/// Hint fields in priority order. The first one present on the error is the
/// hint; later fields are not consulted even if the first fails to parse.
pub const HINT_FIELDS: &[&str] = &[
    "retry-after",
    "x-ratelimit-reset",
    "x-ratelimit-reset-requests",
    "x-ratelimit-reset-tokens",
    "ratelimit-reset",
];

/// Values at or above this are read as Unix timestamps even when they lie in
/// the past: a delta of 30+ years is never meant literally.
const TIMESTAMP_FLOOR_SECS: i64 = 1_000_000_000;

/// How a hint value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    DeltaSeconds,
    UnixTimestamp,
}

/// Integer hint found on an error, not yet resolved against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryHint {
    /// Field the value was read from.
    pub field: &'static str,
    pub value: i64,
}

impl RetryHint {
    /// Disambiguate delta-seconds from an absolute timestamp by magnitude:
    /// anything later than `now` (in whole seconds) is a timestamp.
    pub fn kind_at(&self, now: SystemTime) -> HintKind {
        let now_secs = unix_millis(now) / 1000;
        if self.value > now_secs || self.value >= TIMESTAMP_FLOOR_SECS {
            HintKind::UnixTimestamp
        } else {
            HintKind::DeltaSeconds
        }
    }

    /// Delay this hint asks for at `now`, clamped at zero.
    pub fn delay_at(&self, now: SystemTime) -> Duration {
        let millis = match self.kind_at(now) {
            HintKind::UnixTimestamp => self
                .value
                .saturating_mul(1000)
                .saturating_sub(unix_millis(now)),
            HintKind::DeltaSeconds => self.value.saturating_mul(1000),
        };
        Duration::from_millis(millis.max(0) as u64)
    }
}

/// Find the hint on an error, if any. `None` when no field is present or the
/// first present field is not an integer.
pub fn retry_hint<E>(error: &E) -> Option<RetryHint>
where
    E: RetryableError + ?Sized,
{
    let (field, raw) = HINT_FIELDS
        .iter()
        .find_map(|field| error.header(field).map(|raw| (*field, raw)))?;
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(RetryHint { field, value }),
        Err(_) => {
            tracing::debug!("ignoring unparsable {} hint {:?}", field, raw);
            None
        }
    }
}

fn unix_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
    }
}
