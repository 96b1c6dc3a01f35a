use anyhow::{Context, Result, bail};
use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "onco_vision.toml";
/// Overrides `server_url` when set.
pub const SERVER_URL_ENV: &str = "ONCO_VISION_SERVER_URL";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the analysis server lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Per-user config file location, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("ai", "OncoVision", "OncoVision")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Read the config file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read config: {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("invalid config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// [`load`](Self::load), then apply [`SERVER_URL_ENV`].
    pub fn load_with_env(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path)?.with_server_override(env::var(SERVER_URL_ENV).ok())
    }

    pub fn with_server_override(mut self, server_url: Option<String>) -> Result<Self> {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url.trim().to_string();
            self.validate()
                .with_context(|| format!("invalid {SERVER_URL_ENV}"))?;
        }
        Ok(self)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("cannot serialise config")?;
        fs::write(path, raw).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.server_url)
            .with_context(|| format!("not a URL: {}", self.server_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("server URL must be http or https: {}", self.server_url);
        }
        if self.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url())
    }

    pub fn health_url(&self) -> String {
        format!("{}/", self.base_url())
    }

    fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}
