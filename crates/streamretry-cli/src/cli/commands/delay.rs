//! `streamretry delay` – evaluate the policy for one failed attempt.

use anyhow::{bail, Result};
use std::time::SystemTime;
use streamretry_core::config::StreamRetryConfig;
use streamretry_core::retry::{self, ApiError, RetryDecision};

/// Split `NAME=VALUE` into its parts.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => bail!("invalid header {:?}, expected NAME=VALUE", raw),
    }
}

pub fn run_delay(
    cfg: &StreamRetryConfig,
    attempt: u32,
    status: u16,
    headers: &[String],
) -> Result<()> {
    let policy = cfg.retry_config()?;
    let mut err = ApiError::http(status, "probe");
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        err = err.with_header(&name, value);
    }

    let classified = retry::classify(&err, &policy);
    println!("classification: {:?}", classified.kind);
    if let Some(hint) = classified.retry_hint {
        let now = SystemTime::now();
        println!(
            "hint: {}={} read as {:?}",
            hint.field,
            hint.value,
            hint.kind_at(now)
        );
    }

    match policy.decide(&err, attempt, SystemTime::now()) {
        RetryDecision::NoRetry => println!(
            "attempt {}/{}: no retry, error propagates",
            attempt + 1,
            policy.attempt_limit()
        ),
        RetryDecision::RetryAfter(delay) => println!(
            "attempt {}/{}: retry after {} ms",
            attempt + 1,
            policy.attempt_limit(),
            delay.as_millis()
        ),
    }
    Ok(())
}
