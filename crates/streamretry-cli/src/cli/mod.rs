//! CLI for inspecting and exercising streamretry policies.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use streamretry_core::config::{self, StreamRetryConfig};

use commands::{run_config, run_delay, run_simulate, SimulateOptions};

/// Top-level CLI for streamretry.
#[derive(Debug, Parser)]
#[command(name = "streamretry")]
#[command(about = "Retry and backoff for streamed API responses", long_about = None)]
pub struct Cli {
    /// Read config from this file instead of ~/.config/streamretry/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Show the config file location and the effective retry policy.
    Config,

    /// Decide whether a failed attempt would be retried, and after how long.
    Delay {
        /// 0-based index of the attempt that failed.
        #[arg(long, default_value = "0")]
        attempt: u32,
        /// HTTP status of the failure.
        #[arg(long, default_value = "429")]
        status: u16,
        /// Response header as NAME=VALUE (repeatable), e.g. retry-after=5.
        #[arg(long = "header", value_name = "NAME=VALUE")]
        headers: Vec<String>,
    },

    /// Stream scripted chunks through the retry wrapper, failing the first N attempts.
    Simulate {
        /// Number of attempts that fail before one succeeds.
        #[arg(long, default_value = "1")]
        fail: u32,
        /// HTTP status used for the failures.
        #[arg(long, default_value = "429")]
        status: u16,
        /// Chunks a failing attempt emits before it fails.
        #[arg(long, default_value = "0")]
        fail_after: usize,
        /// Retry-After value attached to failures.
        #[arg(long, value_name = "VALUE")]
        retry_after: Option<String>,
        /// Chunks of the successful stream, separated by '|'.
        #[arg(long, default_value = "Hel|lo|, wor|ld")]
        chunks: String,
        /// Record backoff delays instead of sleeping.
        #[arg(long)]
        instant: bool,
        /// Print one JSON object per event.
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<StreamRetryConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Config => run_config(cli.config.as_deref(), &cfg)?,
            CliCommand::Delay {
                attempt,
                status,
                headers,
            } => run_delay(&cfg, attempt, status, &headers)?,
            CliCommand::Simulate {
                fail,
                status,
                fail_after,
                retry_after,
                chunks,
                instant,
                json,
            } => {
                let opts = SimulateOptions {
                    fail,
                    status,
                    fail_after,
                    retry_after,
                    chunks: chunks.split('|').map(str::to_string).collect(),
                    instant,
                    json,
                };
                run_simulate(&cfg, opts).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
