use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::provider::cwb::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

/// Environment variable that overrides the stored authorization token.
pub const API_KEY_ENV: &str = "CWB_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "CWB-..."
/// current_city = "高雄市"
/// sunrise_table = "/usr/share/cwb/sunrise-sunset.json"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// CWB open-data authorization token.
    pub api_key: Option<String>,

    /// Override of the datastore base URL.
    pub base_url: Option<String>,

    pub timeout_secs: Option<u64>,

    /// Path to the sunrise/sunset JSON table.
    pub sunrise_table: Option<PathBuf>,

    /// Last selected display city name.
    pub current_city: Option<String>,
}

impl Config {
    /// Token from the environment, falling back to the stored one.
    pub fn api_key(&self) -> Option<String> {
        env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT.as_secs())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
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

    /// Save config to `path`, creating parent directories as needed.
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
        let dirs = ProjectDirs::from("tw", "cwb-weather", "cwb-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// A [`Config`] bound to the file it came from.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    config: Config,
}

impl ConfigFile {
    /// Open the config at the platform default location.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::config_file_path()?)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load_from(&path)?;
        debug!(path = %path.display(), "loaded configuration");

        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn save(&self) -> Result<()> {
        self.config.save_to(&self.path)
    }

    pub fn current_city(&self) -> Option<&str> {
        self.config.current_city.as_deref()
    }

    /// Record the selected city and write it to disk immediately.
    ///
    /// The in-memory value only changes once the write succeeded.
    pub fn set_current_city(&mut self, display_name: &str) -> Result<()> {
        if self.current_city() == Some(display_name) {
            return Ok(());
        }

        let mut updated = self.config.clone();
        updated.current_city = Some(display_name.to_string());
        updated.save_to(&self.path)?;

        self.config = updated;
        debug!(city = display_name, "persisted current city");

        Ok(())
    }
}
