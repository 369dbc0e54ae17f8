// ABOUTME: Configuration management for the employee records console
// ABOUTME: Handles connection profiles and preferences stored as JSON

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
}

/// Connection profile for the SQL Server holding the employee procedures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_true")]
    pub trust_certificate: bool,
}

fn default_port() -> u16 {
    1433
}

fn default_database() -> String {
    "company".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            host: "localhost".to_string(),
            port: default_port(),
            username: "sa".to_string(),
            password: String::new(),
            database: default_database(),
            trust_certificate: true,
        }
    }
}

/// Application preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    /// Schema the employee procedures live in
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Word the operator must type before a permanent delete
    #[serde(default = "default_confirm_token")]
    pub confirm_token: String,
}

fn default_schema() -> String {
    "dbo".to_string()
}

fn default_confirm_token() -> String {
    "CONFIRM".to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            confirm_token: default_confirm_token(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_active_profile")]
    pub active_profile: String,
    #[serde(default)]
    pub profiles: HashMap<String, ConnectionProfile>,
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_version() -> u32 {
    1
}

fn default_active_profile() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert("default".to_string(), ConnectionProfile::default());

        Self {
            version: 1,
            active_profile: "default".to_string(),
            profiles,
            preferences: Preferences::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path based on OS
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirFound)?;
        Ok(config_dir.join("Employee Records").join("config.json"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from `path`, writing the defaults there if it does not exist yet
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            log::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the active connection profile
    pub fn active_profile(&self) -> Result<&ConnectionProfile, ConfigError> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| ConfigError::ProfileNotFound(self.active_profile.clone()))
    }

    /// Switch the active profile, failing if `key` is not configured
    pub fn select_profile(&mut self, key: &str) -> Result<(), ConfigError> {
        if !self.profiles.contains_key(key) {
            return Err(ConfigError::ProfileNotFound(key.to_string()));
        }
        self.active_profile = key.to_string();
        Ok(())
    }

    /// Replace the active profile's password, e.g. from the environment
    pub fn apply_password_override(&mut self, password: Option<String>) -> Result<(), ConfigError> {
        let Some(password) = password else {
            return Ok(());
        };
        let active = self.active_profile.clone();
        let profile = self
            .profiles
            .get_mut(&active)
            .ok_or(ConfigError::ProfileNotFound(active))?;
        profile.password = password;
        Ok(())
    }
}
