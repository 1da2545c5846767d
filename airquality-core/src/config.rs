use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    aqi::LabelLocale,
    delay::{DelayPolicy, LatencyConfig},
    source::SourceId,
};

/// Settings for a single source. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's public endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Seed for the synthetic generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Optional default source id, e.g. "openaq-v3" or "synthetic".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,

    #[serde(default)]
    pub label_locale: LabelLocale,

    /// Artificial latency before each source call; absent means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyConfig>,

    /// Example TOML:
    /// [sources.openaq-v3]
    /// api_key = "..."
    #[serde(default)]
    pub sources: HashMap<String, SourceConfig>,
}

impl Config {
    /// Return the default source, falling back to the synthetic generator
    /// when no live provider has been configured.
    pub fn default_source_id(&self) -> Result<SourceId> {
        match self.default_source.as_deref() {
            Some(s) => SourceId::try_from(s),
            None => Ok(SourceId::Synthetic),
        }
    }

    pub fn source_config(&self, id: SourceId) -> Option<&SourceConfig> {
        self.sources.get(id.as_str())
    }

    pub fn set_default_source(&mut self, id: SourceId) {
        self.default_source = Some(id.as_str().to_string());
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        self.latency.map(DelayPolicy::from).unwrap_or_default()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "airquality", "airquality-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a source API key and make it the default if none is set.
    pub fn upsert_source_key(&mut self, id: SourceId, api_key: String) {
        self.sources.entry(id.as_str().to_string()).or_default().api_key = Some(api_key);

        if self.default_source.is_none() {
            self.default_source = Some(id.to_string());
        }
    }

    pub fn source_api_key(&self, id: SourceId) -> Option<&str> {
        self.source_config(id).and_then(|cfg| cfg.api_key.as_deref())
    }

    pub fn is_source_configured(&self, id: SourceId) -> bool {
        !id.requires_api_key() || self.source_api_key(id).is_some()
    }
}
