//! Batch link processing: clean, classify, and optionally expand short links.
//!
//! The engine is stateless; everything that varies per call (settings
//! snapshot, site overrides) travels in a [`CleanContext`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::config::{CleanlinkConfig, ResolverConfig, Settings, SiteOverride};
use crate::export::CsvRow;
use crate::resolver::{FailureReason, ResolutionOutcome, Resolver};
use crate::rules::{clean, RulesConfig};
use crate::sensitivity::{is_sensitive, needs_expansion};

pub const NOTE_SENSITIVE: &str = "sensitive";
pub const NOTE_SITE_BLOCKED: &str = "site-blocked";
pub const NOTE_EXPAND_TIMEOUT: &str = "expand-timeout";
pub const NOTE_EXPAND_ERROR: &str = "expand-error";

/// Per-call snapshot of user state.
#[derive(Debug, Clone, Default)]
pub struct CleanContext {
    pub settings: Settings,
    pub site_overrides: BTreeMap<String, SiteOverride>,
}

impl CleanContext {
    pub fn from_config(cfg: &CleanlinkConfig) -> Self {
        Self {
            settings: cfg.settings,
            site_overrides: cfg.site_overrides.clone(),
        }
    }

    /// True when the link's host carries a `block` override.
    pub fn is_blocked(&self, raw: &str) -> bool {
        let Ok(url) = Url::parse(raw) else {
            return false;
        };
        url.host_str()
            .and_then(|host| self.site_overrides.get(host))
            .is_some_and(|o| *o == SiteOverride::Block)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkScanResult {
    pub original: String,
    pub cleaned: String,
    /// Names of removed parameters, in removal order.
    #[serde(default)]
    pub removed: Vec<String>,
    #[serde(default)]
    pub preserved: Vec<String>,
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    /// Destination of a resolved short link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LinkScanResult {
    fn passthrough(raw: &str, note: &str) -> Self {
        Self {
            original: raw.to_string(),
            cleaned: raw.to_string(),
            removed: Vec::new(),
            preserved: Vec::new(),
            final_url: Some(raw.to_string()),
            expanded: None,
            notes: Some(note.to_string()),
        }
    }

    pub fn changed(&self) -> bool {
        self.cleaned != self.original
    }

    /// Skipped by cleaning (blocked site or sensitive link).
    pub fn is_ignored(&self) -> bool {
        matches!(
            self.notes.as_deref(),
            Some(NOTE_SENSITIVE) | Some(NOTE_SITE_BLOCKED)
        )
    }

    /// Where the link finally leads: the expansion if any, else the cleaned URL.
    pub fn final_target(&self) -> &str {
        self.expanded.as_deref().unwrap_or(&self.cleaned)
    }

    pub fn to_csv_row(&self) -> CsvRow {
        CsvRow {
            original: self.original.clone(),
            cleaned: self.cleaned.clone(),
            final_url: self.final_target().to_string(),
        }
    }

    fn apply_resolution(&mut self, outcome: ResolutionOutcome) {
        match outcome {
            ResolutionOutcome::Resolved { final_url } => {
                self.final_url = Some(final_url.clone());
                self.expanded = Some(final_url);
            }
            ResolutionOutcome::Failed { reason } => {
                self.expanded = None;
                self.notes = Some(
                    match reason {
                        FailureReason::Timeout => NOTE_EXPAND_TIMEOUT,
                        FailureReason::Error => NOTE_EXPAND_ERROR,
                    }
                    .to_string(),
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkSummary {
    pub detected: usize,
    pub changed: usize,
    pub ignored: usize,
}

impl LinkSummary {
    pub fn of(links: &[LinkScanResult]) -> Self {
        Self {
            detected: links.len(),
            changed: links.iter().filter(|l| l.changed()).count(),
            ignored: links.iter().filter(|l| l.is_ignored()).count(),
        }
    }
}

/// Clean one link under `ctx`.
pub fn process_link(raw: &str, ctx: &CleanContext, rules: &RulesConfig) -> LinkScanResult {
    if ctx.is_blocked(raw) {
        return LinkScanResult::passthrough(raw, NOTE_SITE_BLOCKED);
    }
    if is_sensitive(raw, rules) {
        return LinkScanResult::passthrough(raw, NOTE_SENSITIVE);
    }
    let result = clean(raw, rules);
    let removed = result.removed_keys();
    LinkScanResult {
        final_url: Some(result.cleaned.clone()),
        original: result.original,
        cleaned: result.cleaned,
        removed,
        preserved: result.preserved,
        expanded: None,
        notes: None,
    }
}

pub fn process_links<S: AsRef<str>>(
    urls: &[S],
    ctx: &CleanContext,
    rules: &RulesConfig,
) -> Vec<LinkScanResult> {
    urls.iter()
        .map(|u| process_link(u.as_ref(), ctx, rules))
        .collect()
}

/// Resolve every cleaned short link concurrently, at most
/// `cfg.max_concurrent` in flight. Ignored links are left alone.
pub async fn expand_links(
    mut links: Vec<LinkScanResult>,
    rules: &RulesConfig,
    resolver: &Resolver,
    cfg: &ResolverConfig,
) -> Vec<LinkScanResult> {
    let limit = Arc::new(Semaphore::new(cfg.max_concurrent.max(1)));
    let hop_timeout = cfg.hop_timeout();
    let mut join_set = JoinSet::new();

    for (idx, link) in links.iter().enumerate() {
        if link.is_ignored() || !needs_expansion(&link.cleaned, rules) {
            continue;
        }
        let resolver = resolver.clone();
        let limit = Arc::clone(&limit);
        let url = link.cleaned.clone();
        join_set.spawn(async move {
            let _permit = limit.acquire_owned().await;
            (idx, resolver.resolve_async(&url, hop_timeout).await)
        });
    }

    let pending = join_set.len();
    let mut failed = 0usize;
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok((idx, outcome)) => {
                if outcome.final_url().is_none() {
                    failed += 1;
                }
                links[idx].apply_resolution(outcome);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("expand task failed: {}", e);
            }
        }
    }
    if pending > 0 {
        tracing::info!("expanded {} short links ({} failed)", pending, failed);
    }
    links
}
