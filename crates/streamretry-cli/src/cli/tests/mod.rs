//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

mod simulate;

#[test]
fn cli_parse_config() {
    assert!(matches!(parse(&["streamretry", "config"]), CliCommand::Config));
}

#[test]
fn cli_parse_global_config_path() {
    let cli = Cli::try_parse_from(["streamretry", "config", "--config", "/tmp/x.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/x.toml")));
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["streamretry", "bench"]).is_err());
}
