use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::provider::openweather::DEFAULT_BASE_URL;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where an API key may come from, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// An environment variable.
    Env(&'static str),
    /// The `api_key` field of the config file.
    ConfigFile,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::Env(name) => write!(f, "environment variable {name}"),
            CredentialSource::ConfigFile => f.write_str("config file"),
        }
    }
}

/// Default resolution order: the two accepted environment aliases, then the config file.
pub const CREDENTIAL_SOURCES: &[CredentialSource] = &[
    CredentialSource::Env("WEATHER_API_KEY"),
    CredentialSource::Env("OPENWEATHER_API_KEY"),
    CredentialSource::ConfigFile,
];

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.openweathermap.org/data/2.5"
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Override for the provider base URL.
    pub base_url: Option<String>,

    pub timeout_secs: Option<u64>,
}

impl Config {
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

    /// Platform config directory shared by the config and preference files.
    pub fn config_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "ocean-weather", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().to_path_buf())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Walks `sources` in order and returns the first non-empty key with its origin.
    ///
    /// `env` looks up an environment variable by name; it is injected so callers
    /// decide where the environment comes from.
    pub fn resolve_api_key<F>(
        &self,
        sources: &[CredentialSource],
        env: F,
    ) -> Option<(String, CredentialSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        sources.iter().find_map(|source| {
            let value = match source {
                CredentialSource::Env(name) => env(*name),
                CredentialSource::ConfigFile => self.api_key.clone(),
            }?;

            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| (trimmed.to_string(), *source))
        })
    }

    /// [`Config::resolve_api_key`] against the process environment and [`CREDENTIAL_SOURCES`].
    pub fn api_key_from_env(&self) -> Option<(String, CredentialSource)> {
        self.resolve_api_key(CREDENTIAL_SOURCES, |name| std::env::var(name).ok())
    }
}
