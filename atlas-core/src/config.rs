use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Credentials for the geocoding service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeocodingConfig {
    /// API key sent as the `X-Api-Key` header. Never logged.
    pub api_key: Option<String>,
}

/// Where fetched weather files and the attractions database live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<city>_weather.json` file per fetched city.
    pub weather_dir: PathBuf,
    /// Path of the SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            weather_dir: PathBuf::from("weather_files"),
            database_path: PathBuf::from("attractions.db"),
        }
    }
}

/// Retry policy for the geocoding client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts before giving up, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled after every failed attempt.
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 5, initial_backoff_ms: 500 }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Return the geocoding API key, erroring with a hint when unset.
    pub fn geocoding_api_key(&self) -> Result<&str> {
        self.geocoding.api_key.as_deref().ok_or_else(|| {
            anyhow!(
                "No geocoding API key configured.\n\
                 Hint: run `atlas configure` and enter your api-ninjas key."
            )
        })
    }

    pub fn set_geocoding_api_key(&mut self, api_key: String) {
        self.geocoding.api_key = Some(api_key);
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "atlas", "atlas-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
