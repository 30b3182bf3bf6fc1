use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User-facing behavior toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Stored for UI clients that clean pages as they load. Scans never
    /// read it; `clean` and CLEAN_LINKS always rewrite.
    #[serde(default, alias = "auto_clean")]
    pub auto_clean: bool,
    /// Report what would change without persisting anything.
    #[serde(default, alias = "preview_only")]
    pub preview_only: bool,
    /// Resolve known short links to their destination.
    #[serde(default, alias = "expand_short")]
    pub expand_short: bool,
}

/// Partial settings update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub auto_clean: Option<bool>,
    #[serde(default)]
    pub preview_only: Option<bool>,
    #[serde(default)]
    pub expand_short: Option<bool>,
}

impl Settings {
    pub fn merged(self, patch: SettingsPatch) -> Self {
        Self {
            auto_clean: patch.auto_clean.unwrap_or(self.auto_clean),
            preview_only: patch.preview_only.unwrap_or(self.preview_only),
            expand_short: patch.expand_short.unwrap_or(self.expand_short),
        }
    }
}

/// Per-site override: `block` leaves every link on that host untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteOverride {
    Allow,
    Block,
}

/// Redirect resolution parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Budget for a single hop, in milliseconds.
    pub timeout_ms: u64,
    /// Maximum resolutions in flight at once for a batch.
    pub max_concurrent: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_concurrent: 8,
        }
    }
}

impl ResolverConfig {
    pub fn hop_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }
}

/// License verification parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseConfig {
    /// Ed25519 public key, raw base64 or PEM.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Honor the developer unlock code. Keep off in production builds.
    #[serde(default)]
    pub allow_dev_unlock: bool,
}

/// Global configuration loaded from `~/.config/cleanlink/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanlinkConfig {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub license: LicenseConfig,
    /// Optional rule catalog replacing the built-in one.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
    /// Host → override.
    #[serde(default)]
    pub site_overrides: BTreeMap<String, SiteOverride>,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("cleanlink")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CleanlinkConfig> {
    load_or_init_at(&config_path()?)
}

pub fn load_or_init_at(path: &Path) -> Result<CleanlinkConfig> {
    if !path.exists() {
        let default_cfg = CleanlinkConfig::default();
        save_at(path, &default_cfg)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CleanlinkConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

pub fn save_at(path: &Path, cfg: &CleanlinkConfig) -> Result<()> {
    let toml = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = CleanlinkConfig::default();
        assert_eq!(cfg.resolver.timeout_ms, 5000);
        assert_eq!(cfg.resolver.max_concurrent, 8);
        assert!(!cfg.license.allow_dev_unlock);
        assert!(!cfg.settings.expand_short);
        assert!(cfg.site_overrides.is_empty());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = CleanlinkConfig::default();
        cfg.site_overrides
            .insert("news.example".to_string(), SiteOverride::Block);
        cfg.settings.expand_short = true;
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CleanlinkConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.settings, cfg.settings);
        assert_eq!(
            parsed.site_overrides.get("news.example"),
            Some(&SiteOverride::Block)
        );
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            rules_path = "/etc/cleanlink/rules.toml"

            [settings]
            autoClean = true
            preview_only = true

            [resolver]
            timeout_ms = 1500
            max_concurrent = 2

            [license]
            public_key = "AAAA"
            allow_dev_unlock = true

            [site_overrides]
            "bank.example" = "block"
            "blog.example" = "allow"
        "#;
        let cfg: CleanlinkConfig = toml::from_str(toml).unwrap();
        assert!(cfg.settings.auto_clean);
        assert!(cfg.settings.preview_only);
        assert!(!cfg.settings.expand_short);
        assert_eq!(cfg.resolver.hop_timeout(), Duration::from_millis(1500));
        assert_eq!(cfg.resolver.max_concurrent, 2);
        assert_eq!(cfg.license.public_key.as_deref(), Some("AAAA"));
        assert!(cfg.license.allow_dev_unlock);
        assert_eq!(cfg.rules_path, Some(PathBuf::from("/etc/cleanlink/rules.toml")));
        assert_eq!(cfg.site_overrides.len(), 2);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: CleanlinkConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.resolver.timeout_ms, 5000);
    }

    #[test]
    fn load_or_init_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.resolver.timeout_ms, 5000);
        let again = load_or_init_at(&path).unwrap();
        assert_eq!(again.resolver.max_concurrent, 8);
    }

    #[test]
    fn settings_patch_merges() {
        let s = Settings::default().merged(SettingsPatch {
            expand_short: Some(true),
            ..Default::default()
        });
        assert!(s.expand_short);
        assert!(!s.auto_clean);
    }
}
