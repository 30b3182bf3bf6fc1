//! URL arguments, falling back to stdin (one URL per line).

use anyhow::{Context, Result};
use std::io::BufRead;

pub fn collect_urls(args: Vec<String>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }
    let stdin = std::io::stdin();
    let mut urls = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("read urls from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            urls.push(line.to_string());
        }
    }
    if urls.is_empty() {
        anyhow::bail!("no URLs given (pass them as arguments or on stdin)");
    }
    Ok(urls)
}
