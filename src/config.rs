use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;

use crate::air::openweather::{DEFAULT_BASE_URL, Location};
use crate::air::pollutant::{PollutantKind, ThresholdTable, Thresholds};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    /// Falls back to TELEGRAM_BOT_TOKEN when empty.
    #[serde(default)]
    telegram_bot_token: String,
    /// Falls back to OPENWEATHER_API_KEY when empty.
    #[serde(default)]
    openweather_api_key: String,
    #[serde(default)]
    location: Option<Location>,
    /// IANA timezone for report timestamps.
    #[serde(default = "default_timezone")]
    timezone: String,
    /// Overrides and additions to the built-in pollutant thresholds.
    #[serde(default)]
    thresholds: HashMap<PollutantKind, Thresholds>,
    #[serde(default = "default_base_url")]
    openweather_base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
}

fn default_timezone() -> String {
    "Asia/Jakarta".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub struct Config {
    pub telegram_bot_token: String,
    pub openweather_api_key: String,
    /// The single point readings are fetched for.
    pub location: Location,
    pub timezone: Tz,
    /// Built-in thresholds merged with the configured ones.
    pub thresholds: ThresholdTable,
    pub openweather_base_url: String,
    pub request_timeout: Duration,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load using `env` for variable lookups instead of the process environment.
    pub fn load_with_env<P, F>(path: P, env: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        let telegram_bot_token = non_empty_or_env(file.telegram_bot_token, "TELEGRAM_BOT_TOKEN", &env);
        let openweather_api_key = non_empty_or_env(file.openweather_api_key, "OPENWEATHER_API_KEY", &env);

        if telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }
        if openweather_api_key.is_empty() {
            return Err(ConfigError::Validation("openweather_api_key is required".into()));
        }

        let location = file.location.unwrap_or_default();
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation("location.name must not be empty".into()));
        }
        if !(-90.0..=90.0).contains(&location.lat) || !(-180.0..=180.0).contains(&location.lon) {
            return Err(ConfigError::Validation(format!(
                "location coordinates out of range: lat={}, lon={}",
                location.lat, location.lon
            )));
        }

        let timezone: Tz = file
            .timezone
            .parse()
            .map_err(|_| ConfigError::Validation(format!("unknown timezone '{}'", file.timezone)))?;

        if let Some((kind, _)) = file.thresholds.iter().find(|(_, t)| !t.is_ascending()) {
            return Err(ConfigError::Validation(format!(
                "thresholds for {kind} must be ascending (good < moderate < unhealthy)"
            )));
        }
        let mut thresholds = ThresholdTable::default();
        thresholds.extend(file.thresholds);

        if file.request_timeout_secs == 0 {
            return Err(ConfigError::Validation("request_timeout_secs must be positive".into()));
        }

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token,
            openweather_api_key,
            location,
            timezone,
            thresholds,
            openweather_base_url: file.openweather_base_url,
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            data_dir,
        })
    }
}

fn non_empty_or_env<F: Fn(&str) -> Option<String>>(value: String, key: &str, env: &F) -> String {
    if value.is_empty() {
        env(key).unwrap_or_default()
    } else {
        value
    }
}
