//! Tests for history, license and serve subcommands.

use super::parse;
use clap::Parser;
use crate::cli::{CliCommand, LicenseCommand};

#[test]
fn cli_parse_history_default_limit() {
    match parse(&["cleanlink", "history"]) {
        CliCommand::History { limit, json } => {
            assert_eq!(limit, 20);
            assert!(!json);
        }
        _ => panic!("expected History"),
    }
}

#[test]
fn cli_parse_history_limit() {
    match parse(&["cleanlink", "history", "--limit", "5", "--json"]) {
        CliCommand::History { limit, json } => {
            assert_eq!(limit, 5);
            assert!(json);
        }
        _ => panic!("expected History with --limit"),
    }
}

#[test]
fn cli_parse_history_clear() {
    assert!(matches!(
        parse(&["cleanlink", "history-clear"]),
        CliCommand::HistoryClear
    ));
}

#[test]
fn cli_parse_license_verify() {
    match parse(&["cleanlink", "license", "verify", "CODE"]) {
        CliCommand::License {
            action: LicenseCommand::Verify { code },
        } => assert_eq!(code, "CODE"),
        _ => panic!("expected License Verify"),
    }
}

#[test]
fn cli_parse_license_status() {
    assert!(matches!(
        parse(&["cleanlink", "license", "status"]),
        CliCommand::License {
            action: LicenseCommand::Status
        }
    ));
}

#[test]
fn cli_parse_license_keygen() {
    assert!(matches!(
        parse(&["cleanlink", "license", "keygen"]),
        CliCommand::License {
            action: LicenseCommand::Keygen
        }
    ));
}

#[test]
fn cli_parse_license_issue() {
    match parse(&[
        "cleanlink",
        "license",
        "issue",
        "--secret-key",
        "c2VjcmV0",
        "--email",
        "user@example.com",
    ]) {
        CliCommand::License {
            action:
                LicenseCommand::Issue {
                    secret_key,
                    email,
                    days,
                },
        } => {
            assert_eq!(secret_key, "c2VjcmV0");
            assert_eq!(email, "user@example.com");
            assert_eq!(days, 365);
        }
        _ => panic!("expected License Issue"),
    }
}

#[test]
fn cli_parse_license_issue_requires_email() {
    assert!(crate::cli::Cli::try_parse_from([
        "cleanlink",
        "license",
        "issue",
        "--secret-key",
        "x"
    ])
    .is_err());
}

#[test]
fn cli_parse_serve() {
    assert!(matches!(parse(&["cleanlink", "serve"]), CliCommand::Serve));
}
