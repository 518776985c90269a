use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poller::PollSettings;
use crate::sample::PresencePolicy;

/// Prefix of the environment variables that override the config file.
pub const ENV_PREFIX: &str = "SENSOR_DASHBOARD_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("`{0}` is not an http(s) URL")]
    InvalidUrl(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Dashboard settings.
///
/// Loaded from `config.json` in the platform config directory, then overridden by
/// `SENSOR_DASHBOARD_*` environment variables.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backend base URL; samples are fetched from `<base_url>/data`.
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub presence: PresencePolicy,
    /// Replay canned samples instead of talking to a backend.
    pub demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            poll_interval_ms: 3000,
            request_timeout_ms: 10_000,
            presence: PresencePolicy::default(),
            demo: false,
        }
    }
}

impl Config {
    /// Location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "sensor-dashboard")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the config file (when present) and applies the process environment on top.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loading config from {}", path.display());

        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides fields from variables looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let lookup = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            var(&key).map(|value| (key, value))
        };

        if let Some((_, url)) = lookup("URL") {
            self.base_url = url;
        }
        if let Some((key, value)) = lookup("INTERVAL_MS") {
            self.poll_interval_ms = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = lookup("TIMEOUT_MS") {
            self.request_timeout_ms = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = lookup("PRESENCE") {
            self.presence = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = lookup("DEMO") {
            self.demo = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key,
                        reason: format!("expected a boolean, got `{value}`"),
                    })
                }
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }

        for (key, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }

        Ok(())
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            presence: self.presence,
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.into(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let pairs: Vec<(String, String)> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

#[test]
fn test_defaults_match_the_dashboard() {
    let settings = Config::default().poll_settings();

    assert_eq!(settings.interval, Duration::from_millis(3000));
    assert_eq!(settings, PollSettings::default());
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_partial_config_file() {
    let config: Config = serde_json::from_str(r#"{"base_url": "http://10.0.0.7:5000", "presence": "legacy"}"#).unwrap();

    assert_eq!(config.base_url, "http://10.0.0.7:5000");
    assert_eq!(config.presence, PresencePolicy::Legacy);
    assert_eq!(config.poll_interval_ms, 3000);
    assert!(!config.demo);
}

#[test]
fn test_environment_overrides() {
    let mut config = Config::default();
    config
        .apply_env(env(&[
            ("SENSOR_DASHBOARD_URL", "https://sensors.example.org"),
            ("SENSOR_DASHBOARD_INTERVAL_MS", "5000"),
            ("SENSOR_DASHBOARD_PRESENCE", "legacy"),
            ("SENSOR_DASHBOARD_DEMO", "true"),
        ]))
        .unwrap();

    assert_eq!(config.base_url, "https://sensors.example.org");
    assert_eq!(config.poll_interval_ms, 5000);
    assert_eq!(config.request_timeout_ms, 10_000);
    assert_eq!(config.presence, PresencePolicy::Legacy);
    assert!(config.demo);
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut config = Config::default();
    let err = config.apply_env(env(&[("SENSOR_DASHBOARD_TIMEOUT_MS", "soon")])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "SENSOR_DASHBOARD_TIMEOUT_MS"));

    let config = Config {
        base_url: "ftp://sensors".into(),
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl(_))));

    let config = Config {
        poll_interval_ms: 0,
        ..Config::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = Config::from_file(Path::new("/nonexistent/sensor-dashboard.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
