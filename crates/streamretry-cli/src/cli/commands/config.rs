//! `streamretry config` – show config and log locations and the effective retry policy.

use anyhow::Result;
use std::path::Path;
use streamretry_core::config::{self, RetrySettings, StreamRetryConfig};
use streamretry_core::logging;

pub fn run_config(explicit: Option<&Path>, cfg: &StreamRetryConfig) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# config file: {}", path.display());
    match logging::log_file_path() {
        Ok(log) => println!("# log file: {}", log.display()),
        Err(e) => println!("# log file: unavailable ({})", e),
    }
    print!("{}", effective_toml(cfg)?);
    Ok(())
}

/// The retry policy actually in force, rendered as a `[retry]` section.
pub fn effective_toml(cfg: &StreamRetryConfig) -> Result<String> {
    let retry = cfg.retry_config()?;
    let effective = StreamRetryConfig {
        retry: Some(RetrySettings::from(&retry)),
    };
    Ok(toml::to_string_pretty(&effective)?)
}
