use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::trace;

use crate::error::{ConfigError, ConfigResult};

/// How the aggregator treats its counters after a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterMode {
    /// Counters accumulate since process start
    #[default]
    Cumulative,

    /// Counters are reset after every report, so each report covers one round
    Rolling,
}

/// Pipeline tuning knobs. Every field is optional in the configuration file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default)]
    pub counters: CounterMode,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval_secs: default_interval_secs(),
            timeout_ms: default_timeout_ms(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            counters: CounterMode::default(),
        }
    }
}

impl Settings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn validate(&self) -> ConfigResult<()> {
        let zero = |name| ConfigError::InvalidSetting {
            name,
            reason: "must be greater than zero".to_string(),
        };

        if self.interval_secs == 0 {
            return Err(zero("interval_secs"));
        }
        if self.timeout_ms == 0 {
            return Err(zero("timeout_ms"));
        }
        if self.workers == 0 {
            return Err(zero("workers"));
        }
        if self.queue_capacity == 0 {
            return Err(zero("queue_capacity"));
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    15
}

fn default_timeout_ms() -> u64 {
    500
}

fn default_workers() -> usize {
    1
}

fn default_queue_capacity() -> usize {
    256
}

/// A check as written in the configuration file, before resolution
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CheckConfig {
    pub name: String,
    pub url: String,
    pub method: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    /// Pins the URL host to this address instead of resolving it
    pub ip: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    pub checks: Vec<CheckConfig>,
}

impl Config {
    /// Parse a JSON configuration. Accepts either a bare array of checks or
    /// an object with `settings` and `checks`.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;

        let config = if value.is_array() {
            Config {
                settings: Settings::default(),
                checks: serde_json::from_value(value)?,
            }
        } else {
            serde_json::from_value(value)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML configuration. Like JSON, either a top-level list of
    /// checks or a mapping with `settings` and `checks`.
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;

        let config = if value.is_sequence() {
            Config {
                settings: Settings::default(),
                checks: serde_yaml::from_value(value)?,
            }
        } else {
            serde_yaml::from_value(value)?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.checks.is_empty() {
            return Err(ConfigError::NoChecks);
        }
        self.settings.validate()
    }
}

/// Read a configuration file. Files ending in `.yaml`/`.yml` are parsed as
/// YAML, `.toml` as TOML, everything else as JSON.
pub fn read_config_file(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    let file_content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let config = match extension.as_deref() {
        Some("yaml" | "yml") => Config::from_yaml_str(&file_content),
        Some("toml") => Config::from_toml_str(&file_content),
        _ => Config::from_json_str(&file_content),
    };

    config.inspect(|config| trace!("loaded config: {config:?}"))
}
