//! Rule catalog: the tunable ruleset consumed by the cleaner and classifier.
//!
//! The catalog is plain data (TOML). Loading compiles hostname patterns and
//! resolves transform names against the registry, so a bad pattern or an
//! unknown transform fails at load time instead of silently doing nothing.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::transform::{self, NamedTransform};

const BUILTIN_RULES: &str = include_str!("default_rules.toml");

/// Prefix that AMP-rendered pages leak into scraped parameter names.
const AMP_PREFIX: &str = "amp;";

/// Errors raised while compiling a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("domain rule {index}: invalid pattern {pattern:?}: {source}")]
    Pattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("domain rule {index}: unknown transform {name:?}")]
    UnknownTransform { index: usize, name: String },
}

/// On-disk shape of one domain rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainRuleSpec {
    /// Regex tested against the hostname (case-insensitive, unanchored).
    pub pattern: String,
    #[serde(default)]
    pub preserve: Vec<String>,
    #[serde(default)]
    pub remove: Vec<String>,
    /// Name of a registered transform, e.g. `googleRedirect`.
    #[serde(default)]
    pub transform: Option<String>,
}

/// On-disk shape of the whole catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub common_prefixes: Vec<String>,
    #[serde(default)]
    pub common_params: Vec<String>,
    #[serde(default)]
    pub safe_query_keys: Vec<String>,
    #[serde(default)]
    pub domain_rules: Vec<DomainRuleSpec>,
    #[serde(default)]
    pub short_domains: Vec<String>,
    #[serde(default)]
    pub sensitive_keywords: Vec<String>,
}

/// A compiled domain rule. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct DomainRule {
    pattern: Regex,
    pub preserve: Vec<String>,
    pub remove: Vec<String>,
    pub transform: Option<NamedTransform>,
}

impl DomainRule {
    pub fn matches(&self, hostname: &str) -> bool {
        self.pattern.is_match(hostname)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// The compiled ruleset. All string sets are lowercased at compile time.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub common_prefixes: Vec<String>,
    pub common_params: Vec<String>,
    pub safe_query_keys: Vec<String>,
    pub domain_rules: Vec<DomainRule>,
    pub short_domains: Vec<String>,
    pub sensitive_keywords: Vec<String>,
}

impl RulesConfig {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        let file: CatalogFile =
            toml::from_str(BUILTIN_RULES).expect("built-in rule catalog is valid TOML");
        Self::compile(file).expect("built-in rule catalog compiles")
    }

    /// Compile a parsed catalog file, normalizing case and validating
    /// every pattern and transform name.
    pub fn compile(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut domain_rules = Vec::with_capacity(file.domain_rules.len());
        for (index, spec) in file.domain_rules.into_iter().enumerate() {
            let pattern = RegexBuilder::new(&spec.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| CatalogError::Pattern {
                    index,
                    pattern: spec.pattern.clone(),
                    source,
                })?;
            let transform = match spec.transform {
                Some(name) => Some(
                    transform::lookup(&name)
                        .ok_or(CatalogError::UnknownTransform { index, name })?,
                ),
                None => None,
            };
            domain_rules.push(DomainRule {
                pattern,
                preserve: lowercase_all(spec.preserve),
                remove: lowercase_all(spec.remove),
                transform,
            });
        }

        Ok(Self {
            common_prefixes: lowercase_all(file.common_prefixes),
            common_params: lowercase_all(file.common_params),
            safe_query_keys: lowercase_all(file.safe_query_keys),
            domain_rules,
            short_domains: lowercase_all(file.short_domains),
            sensitive_keywords: lowercase_all(file.sensitive_keywords),
        })
    }

    /// Parse and compile a catalog from TOML text.
    pub fn from_toml_str(data: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(data).context("parse rule catalog")?;
        Ok(Self::compile(file)?)
    }

    /// Load a catalog from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read rule catalog: {}", path.display()))?;
        let rules = Self::from_toml_str(&data)
            .with_context(|| format!("load rule catalog: {}", path.display()))?;
        tracing::info!(
            "loaded rule catalog from {} ({} domain rules)",
            path.display(),
            rules.domain_rules.len()
        );
        Ok(rules)
    }

    /// Builtin catalog unless `path` is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Ok(Self::builtin()),
        }
    }

    /// True if a query parameter is a generic tracker.
    pub fn is_tracking_param(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.common_params.iter().any(|p| *p == lower)
            || self
                .common_prefixes
                .iter()
                .any(|prefix| lower.starts_with(prefix.as_str()))
            || (lower.starts_with(AMP_PREFIX) && !self.safe_query_keys.iter().any(|k| *k == lower))
    }

    /// Domain rules whose pattern matches the host of `raw`, in catalog order.
    pub fn domain_rules_for(&self, raw: &str) -> Vec<&DomainRule> {
        let Some(host) = url::Url::parse(raw)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        else {
            return Vec::new();
        };
        self.domain_rules.iter().filter(|r| r.matches(&host)).collect()
    }

    /// True if `host` is on the short-link allowlist (exact, case-insensitive).
    pub fn is_short_domain(&self, host: &str) -> bool {
        let lower = host.to_lowercase();
        self.short_domains.iter().any(|d| *d == lower)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_compiles() {
        let rules = RulesConfig::builtin();
        assert_eq!(rules.domain_rules.len(), 3);
        assert!(rules.common_params.contains(&"fbclid".to_string()));
        assert_eq!(
            rules.domain_rules[0].transform.map(|t| t.name),
            Some("googleRedirect")
        );
    }

    #[test]
    fn string_sets_are_lowercased() {
        let rules = RulesConfig::builtin();
        let amazon = &rules.domain_rules[2];
        assert!(amazon.remove.contains(&"linkcode".to_string()));
        assert!(amazon.remove.contains(&"creativeasin".to_string()));
    }

    #[test]
    fn patterns_match_case_insensitively() {
        let rules = RulesConfig::builtin();
        assert!(rules.domain_rules[0].matches("WWW.GOOGLE.COM"));
        assert!(rules.domain_rules[1].matches("m.youtube.com"));
        assert!(!rules.domain_rules[1].matches("youtube.com.evil.net"));
    }

    #[test]
    fn domain_rules_for_url_host() {
        let rules = RulesConfig::builtin();
        let hits = rules.domain_rules_for("https://www.youtube.com/watch?v=1&si=x");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pattern(), rules.domain_rules[1].pattern());
        assert!(rules.domain_rules_for("https://example.org/").is_empty());
        assert!(rules.domain_rules_for("not a url").is_empty());
    }

    #[test]
    fn tracking_param_classification() {
        let rules = RulesConfig::builtin();
        assert!(rules.is_tracking_param("utm_source"));
        assert!(rules.is_tracking_param("UTM_Medium"));
        assert!(rules.is_tracking_param("fbclid"));
        assert!(rules.is_tracking_param("amp;foo"));
        assert!(!rules.is_tracking_param("id"));
        assert!(!rules.is_tracking_param("page"));
    }

    #[test]
    fn unknown_transform_rejected() {
        let toml = r#"
            [[domain_rules]]
            pattern = 'example\.com'
            transform = "nope"
        "#;
        let err = RulesConfig::from_toml_str(toml).unwrap_err();
        let cause = err.downcast_ref::<CatalogError>().unwrap();
        assert!(matches!(cause, CatalogError::UnknownTransform { index: 0, .. }));
    }

    #[test]
    fn bad_pattern_rejected() {
        let toml = r#"
            [[domain_rules]]
            pattern = '('
        "#;
        let err = RulesConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CatalogError>(),
            Some(CatalogError::Pattern { .. })
        ));
    }

    #[test]
    fn short_domain_exact_match() {
        let rules = RulesConfig::builtin();
        assert!(rules.is_short_domain("bit.ly"));
        assert!(rules.is_short_domain("BIT.LY"));
        assert!(!rules.is_short_domain("www.bit.ly"));
    }

    #[test]
    fn load_from_path_reads_custom_catalog() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"common_params = [\"Foo\"]\n").unwrap();
        f.flush().unwrap();
        let rules = RulesConfig::load(Some(f.path())).unwrap();
        assert_eq!(rules.common_params, vec!["foo".to_string()]);
        assert!(rules.domain_rules.is_empty());
    }
}
