//! Unit and theme preferences, persisted through a key-value store.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, fs,
    path::PathBuf,
};

use crate::{config::Config, model::UnitSystem};

pub const UNITS_KEY: &str = "units";
pub const THEME_KEY: &str = "theme";

/// String key-value storage for preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Session-scoped store; nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// TOML-backed store, rewritten on every `set`.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    /// Opens the store in the platform config directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::config_dir()?.join("preferences.toml"))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let values: BTreeMap<String, String> = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse preferences: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(&*values).context("Failed to serialize preferences")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Theme {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow::anyhow!("Unknown theme '{value}'. Supported: light, dark.")),
        }
    }
}

/// Current preference values plus the store they are written back to.
pub struct Preferences<'a> {
    store: &'a dyn PreferenceStore,
    units: UnitSystem,
    theme: Theme,
}

impl fmt::Debug for Preferences<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("units", &self.units)
            .field("theme", &self.theme)
            .finish()
    }
}

impl<'a> Preferences<'a> {
    /// Reads both preferences; anything other than `imperial` / `dark` means the default.
    pub fn load(store: &'a dyn PreferenceStore) -> Self {
        let units = match store.get(UNITS_KEY).as_deref() {
            Some("imperial") => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        };
        let theme = match store.get(THEME_KEY).as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        };

        Self { store, units, theme }
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_units(&mut self, units: UnitSystem) {
        self.units = units;
        self.persist(UNITS_KEY, units.as_str());
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.persist(THEME_KEY, theme.as_str());
    }

    pub fn toggle_units(&mut self) -> UnitSystem {
        self.set_units(self.units.toggled());
        self.units
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    // Storage failures never interrupt the session.
    fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %format!("{e:#}"), "failed to persist preference");
        }
    }
}
