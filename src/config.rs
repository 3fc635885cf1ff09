/// Service configuration loader - parses floodrisk.toml
///
/// Keeps tunables (poll intervals, history window, feed selection, the
/// simulator's starting point) out of the code. Every section is optional;
/// an absent file yields the defaults. Secrets never live here: the
/// database URL and Supabase key come from the environment.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::Reading;

pub const DEFAULT_CONFIG_PATH: &str = "floodrisk.toml";

/// Longest history window accepted, one year.
pub const MAX_HISTORY_WINDOW_HOURS: i64 = 24 * 365;

/// Errors raised while reading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// Random-walk telemetry, no external dependencies.
    Simulated,
    /// Poll the `flood_data` table directly.
    Database,
    /// Poll `flood_data` through the Supabase REST API.
    Rest,
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub feed: FeedConfig,
    pub simulator: SimulatorConfig,
    pub monitor: MonitorConfig,
    pub endpoint: EndpointConfig,
    pub rest: RestConfig,
    /// Path of the neighbourhood registry.
    pub zones_file: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub kind: FeedKind,
    /// Seconds between polls of the database or REST feed.
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Seconds between simulated readings.
    pub interval_secs: u64,
    pub initial_precipitation: f64,
    pub initial_river_level: f64,
    pub initial_humidity: f64,
    pub initial_temperature: f64,
    /// Fixed seed for reproducible runs. Random when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sensor records older than this drop out of the history window.
    pub history_window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Port for the HTTP endpoint. Disabled when absent.
    pub port: Option<u16>,
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Table exposed through PostgREST.
    pub table: String,
    /// Environment variable holding the project URL.
    pub url_env: String,
    /// Environment variable holding the API key.
    pub key_env: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            simulator: SimulatorConfig::default(),
            monitor: MonitorConfig::default(),
            endpoint: EndpointConfig::default(),
            rest: RestConfig::default(),
            zones_file: "zones.toml".to_string(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kind: FeedKind::Simulated,
            poll_interval_secs: 15,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            initial_precipitation: 0.0,
            initial_river_level: 2.1,
            initial_humidity: 68.0,
            initial_temperature: 24.0,
            seed: None,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_window_hours: 24,
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            port: None,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            table: "flood_data".to_string(),
            url_env: "SUPABASE_URL".to_string(),
            key_env: "SUPABASE_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

impl SimulatorConfig {
    pub fn initial_reading(&self) -> Reading {
        Reading::new(
            self.initial_precipitation,
            self.initial_river_level,
            self.initial_humidity,
            self.initial_temperature,
        )
    }
}

impl ServiceConfig {
    /// Rejects values the daemon cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.interval_secs == 0 {
            return Err(ConfigError::Invalid("simulator.interval_secs must be > 0".into()));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("feed.poll_interval_secs must be > 0".into()));
        }
        if !(1..=MAX_HISTORY_WINDOW_HOURS).contains(&self.monitor.history_window_hours) {
            return Err(ConfigError::Invalid(format!(
                "monitor.history_window_hours must be between 1 and {}",
                MAX_HISTORY_WINDOW_HOURS
            )));
        }
        Ok(())
    }
}

/// Parses configuration from a TOML string.
pub fn parse_config(contents: &str, path: &Path) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Like `load_config`, but a missing file yields the defaults.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "no configuration file, using defaults");
        return Ok(ServiceConfig::default());
    }
    load_config(path)
}
