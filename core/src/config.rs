use crate::errors::{PartyError, PartyResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_MODEL: &str = "grok-3-mini";
pub const DEFAULT_TURN_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_PAUSE_POLL_MS: u64 = 100;

/// Environment variable holding the API credential
pub const API_KEY_ENV: &str = "GROK_API_KEY";

/// Configuration struct for GrokParty
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PartyConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub decision_model: Option<String>,
    pub turn_interval_ms: Option<u64>,
    pub pause_poll_ms: Option<u64>,
    pub max_characters: Option<usize>,
    pub character_search: Option<bool>,
    pub export_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            default_model: Some(DEFAULT_MODEL.to_string()),
            decision_model: None,
            turn_interval_ms: Some(DEFAULT_TURN_INTERVAL_MS),
            pause_poll_ms: Some(DEFAULT_PAUSE_POLL_MS),
            max_characters: None,
            character_search: Some(true),
            export_dir: None,
            log_level: Some("warn".to_string()),
        }
    }
}

impl PartyConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> PartyResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                PartyError::config(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                PartyError::config(format!("Failed to parse config file: {}", e))
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> PartyResult<()> {
        let content = toml::to_string(self)
            .map_err(|e| PartyError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PartyError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content)
            .map_err(|e| PartyError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            base_url: other.base_url.clone().or_else(|| self.base_url.clone()),
            default_model: other
                .default_model
                .clone()
                .or_else(|| self.default_model.clone()),
            decision_model: other
                .decision_model
                .clone()
                .or_else(|| self.decision_model.clone()),
            turn_interval_ms: other.turn_interval_ms.or(self.turn_interval_ms),
            pause_poll_ms: other.pause_poll_ms.or(self.pause_poll_ms),
            max_characters: other.max_characters.or(self.max_characters),
            character_search: other.character_search.or(self.character_search),
            export_dir: other.export_dir.clone().or_else(|| self.export_dir.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    /// Pacing delay between turns
    pub fn turn_interval(&self) -> Duration {
        Duration::from_millis(self.turn_interval_ms.unwrap_or(DEFAULT_TURN_INTERVAL_MS))
    }

    /// How long the key listener waits for input before re-checking state
    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms.unwrap_or(DEFAULT_PAUSE_POLL_MS))
    }

    pub fn character_search_enabled(&self) -> bool {
        self.character_search.unwrap_or(true)
    }

    pub fn default_model(&self) -> &str {
        self.default_model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Checks a requested roster size against the minimum of two and the optional cap
    pub fn check_roster_size(&self, size: usize) -> PartyResult<()> {
        if size < 2 {
            return Err(PartyError::config(format!(
                "A conversation needs at least 2 characters, got {}",
                size
            )));
        }
        if let Some(max) = self.max_characters {
            if size > max {
                return Err(PartyError::config(format!(
                    "At most {} characters are allowed, got {}",
                    max, size
                )));
            }
        }
        Ok(())
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> PartyResult<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| PartyError::config("Could not determine home directory"))?;

    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> PartyResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
