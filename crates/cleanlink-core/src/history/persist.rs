//! File-backed history (JSON array under the XDG state dir).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{cap, normalize, HistoryItem};
use crate::config::Settings;
use crate::license::now_millis;
use crate::scan::LinkScanResult;

/// History persisted at one path. Each operation reads and rewrites the
/// whole file, so the store holds no in-memory state between calls.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Default path: `~/.local/state/cleanlink/history.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("cleanlink")?;
        Ok(xdg_dirs.get_state_home().join("history.json"))
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::at(Self::default_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent first, at most `limit` entries.
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryItem>> {
        let items = self.load()?;
        Ok(items.into_iter().rev().take(limit).collect())
    }

    /// Append in order, evicting the oldest beyond the cap.
    pub fn append(&self, items: Vec<HistoryItem>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }
        let mut current = self.load()?;
        let added = items.len();
        current.extend(items);
        let merged = cap(current);
        tracing::debug!("history: +{} entries, {} stored", added, merged.len());
        self.save(&merged)
    }

    /// Record scanned links unless `settings.preview_only` is set.
    /// Returns how many entries were written.
    pub fn record(&self, links: &[LinkScanResult], bulk: bool, settings: &Settings) -> Result<usize> {
        if settings.preview_only {
            tracing::debug!("preview only: not recording {} links", links.len());
            return Ok(0);
        }
        let now = now_millis();
        let items: Vec<HistoryItem> = links
            .iter()
            .map(|l| HistoryItem::from_scan(l, now, bulk))
            .collect();
        let written = items.len();
        self.append(items)?;
        Ok(written)
    }

    /// Replace the whole history (oldest first).
    pub fn replace(&self, items: Vec<HistoryItem>) -> Result<()> {
        self.save(&cap(items))
    }

    pub fn clear(&self) -> Result<()> {
        self.save(&[])
    }

    /// All stored entries, oldest first. A missing file is an empty history.
    fn load(&self) -> Result<Vec<HistoryItem>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("read history: {}", self.path.display()))
            }
        };
        let value: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("history file {} unreadable, starting empty: {}", self.path.display(), e);
                return Ok(Vec::new());
            }
        };
        Ok(normalize(value))
    }

    fn save(&self, items: &[HistoryItem]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(items).context("serialize history")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("write history: {}", self.path.display()))?;
        Ok(())
    }
}
