//! Console configuration.
//!
//! Values are layered: defaults, then `<config_dir>/agenta/config.json`, then
//! environment variables:
//! - `AGENTA_API_URL` - Base URL of the records API
//! - `AGENTA_PIN` - The shared 4-digit access PIN
//! - `AGENTA_STORAGE` - Path of the local storage database

use std::fs;
use std::path::{Path, PathBuf};

use dirs::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{Credential, RestorePolicy};

const APP_NAME: &str = "agenta";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "https://insurance-agenta-server.onrender.com/api";
pub const DEFAULT_PIN: &str = "5434";

/// Page sizes offered by the list views.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 20];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("PIN must be exactly 4 digits")]
    InvalidPin,

    #[error("Page size must be one of 5, 10 or 20 (got {0})")]
    InvalidPageSize(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the remote records API, without a trailing slash.
    pub api_url: String,
    /// The shared access PIN.
    pub pin: String,
    /// Local storage database. `None` uses the platform data directory.
    pub storage_path: Option<PathBuf>,
    /// Rows per page in list views.
    pub page_size: usize,
    pub request_timeout_secs: u64,
    /// Whether a persisted login survives a restart without re-entering the PIN.
    pub trust_on_restart: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            pin: DEFAULT_PIN.to_string(),
            storage_path: None,
            page_size: PAGE_SIZE_OPTIONS[0],
            request_timeout_secs: 30,
            trust_on_restart: true,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from the user's config directory and the environment.
    /// A missing config file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;
        let mut config = Self::load_from(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file, without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("AGENTA_API_URL") {
            self.api_url = url;
        }
        if let Some(pin) = lookup("AGENTA_PIN") {
            self.pin = pin;
        }
        if let Some(path) = lookup("AGENTA_STORAGE") {
            self.storage_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Credential::parse(&self.pin)?;
        if !PAGE_SIZE_OPTIONS.contains(&self.page_size) {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }
        Ok(())
    }

    /// The configured PIN as a credential.
    pub fn credential(&self) -> Result<Credential, ConfigError> {
        Credential::parse(&self.pin)
    }

    pub fn restore_policy(&self) -> RestorePolicy {
        if self.trust_on_restart {
            RestorePolicy::TrustPersistedFlag
        } else {
            RestorePolicy::RequireLogin
        }
    }

    /// API base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Save the configuration to the user's config directory.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(write_err)?;
        Ok(())
    }
}

fn config_path() -> Result<PathBuf, ConfigError> {
    let mut path = config_dir().ok_or(ConfigError::NoConfigDir)?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = ConsoleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.restore_policy(), RestorePolicy::TrustPersistedFlag);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConsoleConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ConsoleConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "pin": "1111", "page_size": 10 }"#).unwrap();

        let config = ConsoleConfig::load_from(&path).unwrap();
        assert_eq!(config.pin, "1111");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ConsoleConfig {
            trust_on_restart: false,
            ..ConsoleConfig::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(ConsoleConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("AGENTA_API_URL", "http://localhost:4000/api/"),
            ("AGENTA_PIN", "0000"),
            ("AGENTA_STORAGE", "/tmp/agenta.db"),
        ]
        .into_iter()
        .collect();

        let mut config = ConsoleConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.base_url(), "http://localhost:4000/api");
        assert_eq!(config.pin, "0000");
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/agenta.db")));
    }

    #[test]
    fn rejects_malformed_pin() {
        for pin in ["", "123", "12345", "12a4"] {
            let config = ConsoleConfig {
                pin: pin.to_string(),
                ..ConsoleConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidPin)), "{pin}");
        }
    }

    #[test]
    fn rejects_unsupported_page_size() {
        let config = ConsoleConfig {
            page_size: 7,
            ..ConsoleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPageSize(7))
        ));
    }
}
