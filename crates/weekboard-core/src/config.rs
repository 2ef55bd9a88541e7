//! TOML-based application configuration.
//!
//! Stores connection settings:
//! - the app namespace (`app_id`) user data is filed under
//! - an optional session token for token sign-in
//! - which store backend to open
//!
//! Configuration is stored at `~/.config/weekboard/config.toml`.
//! `WEEKBOARD_DATA_DIR` relocates the whole data directory, and
//! `WEEKBOARD_APP_ID` / `WEEKBOARD_AUTH_TOKEN` / `WEEKBOARD_STORE`
//! override single values without touching the file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// Namespace used when none is configured.
pub const DEFAULT_APP_ID: &str = "default-habit-tracker";

/// Returns the data directory, creating it if needed.
///
/// `~/.config/weekboard/` by default; `WEEKBOARD_DATA_DIR` overrides
/// the full path.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var("WEEKBOARD_DATA_DIR") {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("weekboard"),
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

/// Which document store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Durable store in `store.db` under the data directory.
    #[default]
    Sqlite,
    /// Volatile in-process store, for scratch use.
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        }
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "store".to_string(),
                message: format!("unknown backend '{other}', expected 'sqlite' or 'memory'"),
            }),
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/weekboard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Namespace all user data lives under.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Session token. When set, sign-in uses it instead of the
    /// persisted anonymous identity.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub store: StoreBackend,
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            auth_token: None,
            store: StoreBackend::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk (writing defaults on first run), then apply
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed, if the default config cannot be written, or if an
    /// environment override holds an invalid value.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        let mut cfg = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| ConfigError::ParseFailed(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save()?;
                cfg
            }
            // An existing file that cannot be read must not be
            // clobbered with defaults.
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path,
                    message: e.to_string(),
                });
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Persist to disk. Environment overrides are never written back.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(app_id) = std::env::var("WEEKBOARD_APP_ID") {
            if !app_id.trim().is_empty() {
                self.app_id = app_id.trim().to_string();
            }
        }
        if let Ok(token) = std::env::var("WEEKBOARD_AUTH_TOKEN") {
            self.auth_token = if token.is_empty() { None } else { Some(token) };
        }
        if let Ok(backend) = std::env::var("WEEKBOARD_STORE") {
            self.store = backend.parse()?;
        }
        Ok(())
    }

    /// Get a config value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "app_id" => Some(self.app_id.clone()),
            "auth_token" => self.auth_token.clone(),
            "store" => Some(self.store.as_str().to_string()),
            _ => None,
        }
    }

    /// Apply one key/value pair without persisting.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value invalid.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "app_id" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: "app_id".to_string(),
                        message: "must not be empty".to_string(),
                    });
                }
                self.app_id = value.to_string();
            }
            "auth_token" => {
                self.auth_token = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "store" => {
                self.store = value.parse()?;
            }
            other => {
                return Err(ConfigError::InvalidValue {
                    key: other.to_string(),
                    message: "unknown configuration key".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value invalid, or
    /// the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.app_id, DEFAULT_APP_ID);
        assert_eq!(parsed.auth_token, None);
        assert_eq!(parsed.store, StoreBackend::Sqlite);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.app_id, DEFAULT_APP_ID);
        assert_eq!(parsed.store, StoreBackend::Sqlite);

        let parsed: Config = toml::from_str("store = \"memory\"").unwrap();
        assert_eq!(parsed.app_id, DEFAULT_APP_ID);
        assert_eq!(parsed.store, StoreBackend::Memory);
    }

    #[test]
    fn backend_parses_known_names_only() {
        assert_eq!("sqlite".parse::<StoreBackend>().unwrap(), StoreBackend::Sqlite);
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("redis".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn get_exposes_every_key() {
        let mut cfg = Config::default();
        cfg.auth_token = Some("secret".to_string());

        assert_eq!(cfg.get("app_id").as_deref(), Some(DEFAULT_APP_ID));
        assert_eq!(cfg.get("auth_token").as_deref(), Some("secret"));
        assert_eq!(cfg.get("store").as_deref(), Some("sqlite"));
        assert!(cfg.get("nonexistent").is_none());
    }

    #[test]
    fn apply_updates_known_keys() {
        let mut cfg = Config::default();

        cfg.apply("app_id", "team-board").unwrap();
        cfg.apply("auth_token", "tok123").unwrap();
        cfg.apply("store", "memory").unwrap();

        assert_eq!(cfg.app_id, "team-board");
        assert_eq!(cfg.auth_token.as_deref(), Some("tok123"));
        assert_eq!(cfg.store, StoreBackend::Memory);
    }

    #[test]
    fn apply_clears_token_on_empty_value() {
        let mut cfg = Config::default();
        cfg.auth_token = Some("tok123".to_string());
        cfg.apply("auth_token", "").unwrap();
        assert_eq!(cfg.auth_token, None);
    }

    #[test]
    fn apply_rejects_unknown_key_and_blank_app_id() {
        let mut cfg = Config::default();
        assert!(cfg.apply("volume", "50").is_err());
        assert!(cfg.apply("app_id", "   ").is_err());
        assert!(cfg.apply("store", "postgres").is_err());
        assert_eq!(cfg.app_id, DEFAULT_APP_ID);
    }
}
