//! CLI for the CleanLink link sanitizer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cleanlink_core::config;
use cleanlink_core::rules::RulesConfig;
use std::path::PathBuf;

use commands::{
    run_check, run_clean, run_expand, run_export_csv, run_history, run_history_clear,
    run_license, run_serve, CleanOptions,
};

/// Top-level CLI for CleanLink.
#[derive(Debug, Parser)]
#[command(name = "cleanlink")]
#[command(about = "CleanLink: strip tracking parameters and expand short links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Remove tracking parameters from URLs (read from stdin when none are given).
    Clean {
        urls: Vec<String>,
        /// Also resolve known short links to their destination.
        #[arg(long)]
        expand: bool,
        /// Print full results as JSON instead of one URL per line.
        #[arg(long)]
        json: bool,
        /// Record the results in history.
        #[arg(long)]
        save: bool,
    },

    /// Follow redirects of a single URL (up to 5 hops).
    Expand {
        url: String,
        /// Per-hop timeout; defaults to `resolver.timeout_ms` from config.
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },

    /// Report how a URL would be treated without changing anything.
    Check { url: String },

    /// Clean URLs and write an original,cleaned,final CSV.
    ExportCsv {
        urls: Vec<String>,
        /// Output file; stdout when omitted.
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        #[arg(long)]
        expand: bool,
    },

    /// Show recent history, most recent first.
    History {
        #[arg(long, default_value = "20", value_name = "N")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },

    /// Delete all history entries.
    HistoryClear,

    /// License verification and issuing.
    License {
        #[command(subcommand)]
        action: LicenseCommand,
    },

    /// Answer newline-delimited JSON messages on stdin/stdout.
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Verify a license code against the configured public key.
    Verify { code: String },

    /// Show the result of the last verification.
    Status,

    /// Generate a new Ed25519 keypair (base64).
    Keygen,

    /// Issue a license code for an email address.
    Issue {
        /// Base64 Ed25519 secret key (32 bytes).
        #[arg(long, value_name = "BASE64")]
        secret_key: String,
        #[arg(long)]
        email: String,
        /// Validity from now, in days.
        #[arg(long, default_value = "365")]
        days: i64,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let rules = RulesConfig::load(cfg.rules_path.as_deref())?;

        match cli.command {
            CliCommand::Clean {
                urls,
                expand,
                json,
                save,
            } => {
                let opts = CleanOptions { expand, json, save };
                run_clean(&cfg, &rules, urls, opts).await?;
            }
            CliCommand::Expand { url, timeout_ms } => run_expand(&cfg, &url, timeout_ms).await?,
            CliCommand::Check { url } => run_check(&cfg, &rules, &url)?,
            CliCommand::ExportCsv { urls, out, expand } => {
                run_export_csv(&cfg, &rules, urls, out.as_deref(), expand).await?;
            }
            CliCommand::History { limit, json } => run_history(limit, json)?,
            CliCommand::HistoryClear => run_history_clear()?,
            CliCommand::License { action } => run_license(&cfg, action)?,
            CliCommand::Serve => run_serve(cfg, rules).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
