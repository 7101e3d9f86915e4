/// Application configuration, read from a JSON file
use crate::schedule::ScheduleError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable holding the path of the configuration file.
pub const CONFIG_ENV_VAR: &str = "HORARIO_CONFIG";

/// Public course feed.
pub const DEFAULT_FEED_URL: &str =
    "https://raw.githubusercontent.com/elmalba/data/refs/heads/main/data.json";

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("horario.sqlite3")
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_days_to_display() -> Vec<u8> {
    vec![1, 2, 3, 4, 5]
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Weekdays shown by the weekly view (0 = Sunday)
    #[serde(default = "default_days_to_display")]
    pub days_to_display: Vec<u8>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            database_path: default_database_path(),
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            days_to_display: default_days_to_display(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration from `path`.
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Parsed config, or the defaults if the file does not exist
    /// * `Err` - If the file can't be read, parsed or fails validation
    pub fn load_from_file(path: &Path) -> Result<Self, ScheduleError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ScheduleError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|e| ScheduleError::Config {
                message: format!("failed to parse {}: {e}", path.display()),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from the file named by `HORARIO_CONFIG`, or
    /// returns the defaults when the variable is unset.
    pub fn from_env() -> Result<Self, ScheduleError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Checks the feed URL and the display days.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        let url = Url::parse(&self.feed_url).map_err(|e| ScheduleError::Config {
            message: format!("invalid feed_url {:?}: {e}", self.feed_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScheduleError::Config {
                message: format!("feed_url must be http(s), got {}", url.scheme()),
            });
        }
        if let Some(day) = self.days_to_display.iter().find(|d| **d > 6) {
            return Err(ScheduleError::Config {
                message: format!("days_to_display contains {day}, expected 0-6"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from_file(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.feed_url, DEFAULT_FEED_URL);
        assert_eq!(config.days_to_display, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "port": 9000, "days_to_display": [1, 3] }"#).unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.days_to_display, vec![1, 3]);
        assert_eq!(config.bind_address, "127.0.0.1");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, r#"{ "feed_url": "not a url" }"#).unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());

        fs::write(&path, r#"{ "feed_url": "ftp://example.com/data.json" }"#).unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());

        fs::write(&path, r#"{ "days_to_display": [8] }"#).unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());

        fs::write(&path, "{").unwrap();
        assert!(AppConfig::load_from_file(&path).is_err());
    }
}
