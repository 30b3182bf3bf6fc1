//! Last verification result, kept under the XDG state dir.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::LicenseState;

impl LicenseState {
    /// Default path: `~/.local/state/cleanlink/license.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("cleanlink")?;
        Ok(xdg_dirs.get_state_home().join("license.json"))
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize license state")?;
        std::fs::write(path, json)
            .with_context(|| format!("write license state: {}", path.display()))?;
        Ok(())
    }

    /// `None` when nothing has been stored yet.
    pub fn load_from_path(path: &Path) -> Result<Option<LicenseState>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read license state: {}", path.display()))
            }
        };
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse license state: {}", path.display()))?;
        Ok(Some(state))
    }
}
