//! `cleanlink serve` – newline-delimited JSON messages over stdin/stdout.

use anyhow::{Context, Result};
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::rules::RulesConfig;
use cleanlink_core::service::Service;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub async fn run_serve(cfg: CleanlinkConfig, rules: RulesConfig) -> Result<()> {
    let mut service = Service::for_user(cfg, Arc::new(rules))?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!("serving messages on stdin/stdout");

    while let Some(line) = lines.next_line().await.context("read message")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = service.handle_json(&line).await;
        let mut out = serde_json::to_string(&response).context("serialize response")?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }
    tracing::info!("stdin closed, stopping");
    Ok(())
}
