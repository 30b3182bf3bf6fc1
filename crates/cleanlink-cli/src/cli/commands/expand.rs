//! `cleanlink expand <URL>` – follow redirects of one URL.

use anyhow::{bail, Result};
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::resolver::{ResolutionOutcome, Resolver};
use std::time::Duration;

pub async fn run_expand(cfg: &CleanlinkConfig, url: &str, timeout_ms: Option<u64>) -> Result<()> {
    let hop_timeout = timeout_ms
        .map(|ms| Duration::from_millis(ms.max(1)))
        .unwrap_or_else(|| cfg.resolver.hop_timeout());

    match Resolver::default().resolve_async(url, hop_timeout).await {
        ResolutionOutcome::Resolved { final_url } => {
            println!("{}", final_url);
            Ok(())
        }
        ResolutionOutcome::Failed { reason } => {
            bail!("could not expand {}: {:?}", url, reason)
        }
    }
}
