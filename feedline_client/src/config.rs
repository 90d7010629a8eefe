use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct FeedlineConfig {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub paths: FeedlinePaths,
}

/// Optional `config.toml` under the feedline home directory.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConfigFile {
    pub api_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FeedlineConfig {
    /// Resolves the home directory, reads `config.toml` if present, then
    /// applies `FEEDLINE_API_URL` and `FEEDLINE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let paths = FeedlinePaths::discover()?;
        let file = ConfigFile::load(&paths.config_file)?;
        Ok(Self::from_parts(paths, file))
    }

    pub fn from_parts(paths: FeedlinePaths, file: ConfigFile) -> Self {
        let api_base_url = env::var("FEEDLINE_API_URL")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .or(file.api_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout_secs = env::var("FEEDLINE_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .or(file.request_timeout_secs)
            .unwrap_or(15);
        Self {
            api_base_url,
            request_timeout_secs,
            paths,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedlinePaths {
    pub base: PathBuf,
    pub config_file: PathBuf,
    pub username_file: PathBuf,
}

impl FeedlinePaths {
    /// `FEEDLINE_HOME` wins; otherwise the platform data directory, falling
    /// back to `.feedline` in the working directory.
    pub fn discover() -> Result<Self> {
        let base = match env::var_os("FEEDLINE_HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => dirs::data_dir()
                .map(|dir| dir.join("feedline"))
                .unwrap_or_else(|| PathBuf::from(".feedline")),
        };
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        Ok(Self {
            config_file: base.join("config.toml"),
            username_file: base.join("username"),
            base,
        })
    }
}
