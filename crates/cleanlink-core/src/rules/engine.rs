//! The cleaning pass: raw URL in, cleaned URL plus a diff out.

use serde::{Deserialize, Serialize};
use url::Url;

use super::catalog::RulesConfig;

/// Synthetic key used when a tracking fragment is dropped.
pub const FRAGMENT_KEY: &str = "#fragment";

const FRAGMENT_TRACKERS: &[&str] = &["utm_", "fbclid", "gclid"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanReason {
    /// Generic tracker from the common parameter/prefix lists.
    Common,
    /// Removed by a domain-specific rule.
    Domain,
}

/// One removed query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanDiff {
    pub key: String,
    pub reason: CleanReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Output of one cleaning pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanResult {
    pub original: String,
    pub cleaned: String,
    pub removed: Vec<CleanDiff>,
    /// Parameter names exempted by matching domain rules (informational).
    pub preserved: Vec<String>,
}

impl CleanResult {
    /// The fail-open result: input returned untouched.
    pub fn unchanged(raw: &str) -> Self {
        Self {
            original: raw.to_string(),
            cleaned: raw.to_string(),
            removed: Vec::new(),
            preserved: Vec::new(),
        }
    }

    pub fn changed(&self) -> bool {
        self.original != self.cleaned
    }

    pub fn removed_keys(&self) -> Vec<String> {
        self.removed.iter().map(|d| d.key.clone()).collect()
    }
}

/// Strip tracking parameters from `raw` using `rules`.
///
/// Never fails: anything that is not an absolute URL, or whose rewrite
/// target is unusable, comes back unchanged.
pub fn clean(raw: &str, rules: &RulesConfig) -> CleanResult {
    try_clean(raw, rules).unwrap_or_else(|| CleanResult::unchanged(raw))
}

fn try_clean(raw: &str, rules: &RulesConfig) -> Option<CleanResult> {
    let mut url = Url::parse(raw).ok()?;
    let mut removed = Vec::new();
    let mut preserved: Vec<String> = Vec::new();

    // Domain rules run first and cumulatively; a transform may change the
    // host, so later rules see the rewritten URL.
    for rule in &rules.domain_rules {
        if !rule.matches(url.host_str().unwrap_or("")) {
            continue;
        }
        if let Some(transform) = rule.transform {
            if let Err(e) = (transform.apply)(&mut url) {
                tracing::debug!("transform {} failed on {}: {}", transform.name, raw, e);
                return None;
            }
        }

        let mut params = query_params(&url);
        let before = params.len();
        for key in &rule.remove {
            let Some((found, value)) = params
                .iter()
                .find(|(k, _)| k.to_lowercase() == *key)
                .cloned()
            else {
                continue;
            };
            params.retain(|(k, _)| k.to_lowercase() != *key);
            removed.push(CleanDiff {
                key: found,
                reason: CleanReason::Domain,
                value: Some(value),
            });
        }
        if params.len() != before {
            write_query(&mut url, &params);
        }

        for name in &rule.preserve {
            if !preserved.contains(name) {
                preserved.push(name.clone());
            }
        }
    }

    let params = query_params(&url);
    let before = params.len();
    let mut kept = Vec::with_capacity(before);
    for (key, value) in params {
        if rules.is_tracking_param(&key) {
            removed.push(CleanDiff {
                key,
                reason: CleanReason::Common,
                value: Some(value),
            });
        } else {
            kept.push((key, value));
        }
    }
    if kept.len() != before {
        write_query(&mut url, &kept);
    }

    if let Some(fragment) = url.fragment().filter(|f| is_tracking_fragment(f)) {
        removed.push(CleanDiff {
            key: FRAGMENT_KEY.to_string(),
            reason: CleanReason::Common,
            value: Some(format!("#{}", fragment)),
        });
        url.set_fragment(None);
    }

    Some(CleanResult {
        original: raw.to_string(),
        cleaned: url.to_string(),
        removed,
        preserved,
    })
}

fn is_tracking_fragment(fragment: &str) -> bool {
    if fragment.is_empty() {
        return false;
    }
    let lower = fragment.to_ascii_lowercase();
    FRAGMENT_TRACKERS.iter().any(|t| lower.contains(t))
}

fn query_params(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Rewrite the query from `params`; an empty list drops the `?` entirely.
fn write_query(url: &mut Url, params: &[(String, String)]) {
    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(params);
    }
}
