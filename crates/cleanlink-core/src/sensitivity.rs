//! Link classification: links that must never be rewritten, and links on
//! known short-link services that are worth expanding.

use url::Url;

use crate::rules::RulesConfig;

/// True if the link looks like a login/auth flow and must be passed through
/// verbatim. Non-HTTP(S) or unparseable links are not sensitive here.
pub fn is_sensitive(raw: &str, rules: &RulesConfig) -> bool {
    let Ok(url) = Url::parse(raw) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let host = url.host_str().unwrap_or("").to_lowercase();
    let path = url.path().to_lowercase();
    let contains_keyword = |s: &str| rules.sensitive_keywords.iter().any(|k| s.contains(k.as_str()));

    if contains_keyword(&host) || contains_keyword(&path) {
        return true;
    }
    url.query_pairs()
        .any(|(k, v)| contains_keyword(&k.to_lowercase()) || contains_keyword(&v.to_lowercase()))
}

/// True iff the hostname is on the short-link allowlist.
pub fn needs_expansion(raw: &str, rules: &RulesConfig) -> bool {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| rules.is_short_domain(h)))
        .unwrap_or(false)
}
