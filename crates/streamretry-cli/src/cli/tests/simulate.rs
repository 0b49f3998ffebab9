//! Tests for the simulate subcommand.

use super::parse;
use crate::cli::CliCommand;

#[test]
fn cli_parse_simulate_defaults() {
    match parse(&["streamretry", "simulate"]) {
        CliCommand::Simulate {
            fail,
            status,
            fail_after,
            retry_after,
            chunks,
            instant,
            json,
        } => {
            assert_eq!(fail, 1);
            assert_eq!(status, 429);
            assert_eq!(fail_after, 0);
            assert!(retry_after.is_none());
            assert_eq!(chunks, "Hel|lo|, wor|ld");
            assert!(!instant);
            assert!(!json);
        }
        _ => panic!("expected Simulate"),
    }
}

#[test]
fn cli_parse_simulate_flags() {
    match parse(&[
        "streamretry",
        "simulate",
        "--fail",
        "3",
        "--fail-after",
        "2",
        "--retry-after",
        "1",
        "--instant",
        "--json",
    ]) {
        CliCommand::Simulate {
            fail,
            fail_after,
            retry_after,
            instant,
            json,
            ..
        } => {
            assert_eq!(fail, 3);
            assert_eq!(fail_after, 2);
            assert_eq!(retry_after.as_deref(), Some("1"));
            assert!(instant);
            assert!(json);
        }
        _ => panic!("expected Simulate"),
    }
}
