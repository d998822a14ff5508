use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::source::Coordinates;

/// Hours returned when the caller does not ask for a specific count.
pub const DEFAULT_HOURS: u16 = 24;

/// Connection settings for the NWS endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NwsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// NWS rejects requests without an identifying User-Agent.
    pub user_agent: String,
}

impl Default for NwsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://forecast.weather.gov".to_string(),
            timeout_secs: 30,
            user_agent: concat!("dwml-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_location = "houston"
/// default_hours = 48
///
/// [nws]
/// timeout_secs = 20
///
/// [locations.houston]
/// latitude = 29.7601
/// longitude = -95.3701
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the saved location used when none is given.
    pub default_location: Option<String>,

    pub default_hours: u16,

    pub nws: NwsConfig,

    pub locations: HashMap<String, Coordinates>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_location: None,
            default_hours: DEFAULT_HOURS,
            nws: NwsConfig::default(),
            locations: HashMap::new(),
        }
    }
}

impl Config {
    /// Coordinates of the default location.
    pub fn default_location(&self) -> Result<Coordinates> {
        let name = self.default_location.as_ref().ok_or_else(|| {
            anyhow!(
                "No default location configured.\n\
                 Hint: run `dwml configure <name>` (e.g. `dwml configure houston`) first."
            )
        })?;

        self.location(name)
    }

    /// Coordinates of a saved location, looked up case-insensitively.
    pub fn location(&self, name: &str) -> Result<Coordinates> {
        self.locations
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "Unknown location '{name}'.\n\
                     Hint: run `dwml configure {name}` and enter its coordinates."
                )
            })
    }

    pub fn has_location(&self, name: &str) -> bool {
        self.locations.contains_key(&name.to_lowercase())
    }

    /// Set or replace a saved location. The first location saved becomes the default.
    pub fn upsert_location(&mut self, name: &str, coords: Coordinates) {
        let name = name.to_lowercase();
        self.locations.insert(name.clone(), coords);

        if self.default_location.is_none() {
            self.default_location = Some(name);
        }
    }

    pub fn set_default_location(&mut self, name: &str) -> Result<()> {
        if !self.has_location(name) {
            return Err(anyhow!("Cannot make unknown location '{name}' the default."));
        }

        self.default_location = Some(name.to_lowercase());
        Ok(())
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
        let dirs = ProjectDirs::from("dev", "dwml", "dwml-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
