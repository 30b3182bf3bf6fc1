//! `cleanlink history` / `cleanlink history-clear`.

use anyhow::Result;
use cleanlink_core::history::HistoryStore;

pub fn run_history(limit: usize, json: bool) -> Result<()> {
    let items = HistoryStore::open_default()?.list(limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("No history.");
        return Ok(());
    }
    println!("{:<14} {:<8} {}", "TIME", "EXPANDED", "FINAL");
    for item in items {
        println!(
            "{:<14} {:<8} {}",
            item.time,
            if item.expanded { "yes" } else { "-" },
            item.final_url
        );
    }
    Ok(())
}

pub fn run_history_clear() -> Result<()> {
    let store = HistoryStore::open_default()?;
    store.clear()?;
    println!("Cleared history at {}", store.path().display());
    Ok(())
}
