//! `cleanlink clean` – strip tracking parameters, optionally expand and save.

use anyhow::Result;
use cleanlink_core::config::CleanlinkConfig;
use cleanlink_core::history::HistoryStore;
use cleanlink_core::messages::ScanData;
use cleanlink_core::resolver::Resolver;
use cleanlink_core::rules::RulesConfig;
use cleanlink_core::scan::{expand_links, process_links, CleanContext, LinkSummary};

use super::input::collect_urls;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    pub expand: bool,
    pub json: bool,
    pub save: bool,
}

pub async fn run_clean(
    cfg: &CleanlinkConfig,
    rules: &RulesConfig,
    urls: Vec<String>,
    opts: CleanOptions,
) -> Result<()> {
    let urls = collect_urls(urls)?;
    let ctx = CleanContext::from_config(cfg);
    let mut links = process_links(&urls, &ctx, rules);
    if opts.expand || ctx.settings.expand_short {
        links = expand_links(links, rules, &Resolver::default(), &cfg.resolver).await;
    }
    let summary = LinkSummary::of(&links);

    if opts.save {
        let saved = HistoryStore::open_default()?.record(&links, false, &cfg.settings)?;
        if saved == 0 && cfg.settings.preview_only {
            eprintln!("preview only: history not saved");
        }
    }

    if opts.json {
        let data = ScanData {
            links,
            summary,
            csv: None,
        };
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    for link in &links {
        match &link.notes {
            Some(note) => println!("{}\t[{}]", link.final_target(), note),
            None => println!("{}", link.final_target()),
        }
    }
    tracing::info!(
        "clean: {} links, {} changed, {} ignored",
        summary.detected,
        summary.changed,
        summary.ignored
    );
    Ok(())
}
