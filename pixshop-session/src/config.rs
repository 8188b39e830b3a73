//! Editor configuration, stored as JSON.

use anyhow::Context;
use pixshop_ai::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Used in archive names, e.g. `<product>-edits.zip`.
    pub product_name: String,
    pub service: ClientConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            product_name: "pixshop".into(),
            service: ClientConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let product = self.product_name.trim();
        if product.is_empty() {
            anyhow::bail!("product_name cannot be empty");
        }
        if product.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|']) {
            anyhow::bail!("product_name contains a character not allowed in file names");
        }
        self.service.validate().context("invalid service config")?;
        Ok(())
    }
}

pub fn save_config(path: impl AsRef<Path>, config: &EditorConfig) -> anyhow::Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(config).context("serialize config to json")?;
    fs::write(path, json).with_context(|| format!("write config file: {}", path.display()))?;
    Ok(())
}

/// Load and validate a config. Missing fields fall back to defaults.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<EditorConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config file: {}", path.display()))?;
    let config: EditorConfig = serde_json::from_str(&data).context("parse config json")?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}
