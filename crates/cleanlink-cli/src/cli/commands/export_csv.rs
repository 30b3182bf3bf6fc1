//! `cleanlink export-csv` – write original,cleaned,final rows.

use anyhow::{Context, Result};
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::export::create_csv;
use cleanlink_core::resolver::Resolver;
use cleanlink_core::rules::RulesConfig;
use cleanlink_core::scan::{expand_links, process_links, CleanContext, LinkScanResult};
use std::path::Path;

use super::input::collect_urls;

pub async fn run_export_csv(
    cfg: &CleanlinkConfig,
    rules: &RulesConfig,
    urls: Vec<String>,
    out: Option<&Path>,
    expand: bool,
) -> Result<()> {
    let urls = collect_urls(urls)?;
    let ctx = CleanContext::from_config(cfg);
    let mut links = process_links(&urls, &ctx, rules);
    if expand || ctx.settings.expand_short {
        links = expand_links(links, rules, &Resolver::default(), &cfg.resolver).await;
    }
    let rows: Vec<_> = links.iter().map(LinkScanResult::to_csv_row).collect();
    let csv = create_csv(&rows);

    match out {
        Some(path) => {
            std::fs::write(path, format!("{csv}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            println!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => println!("{}", csv),
    }
    Ok(())
}
