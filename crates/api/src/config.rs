//! Application configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `SURAKSHA__SECTION__KEY` environment variables.

use crate::simulation::SimulationConfig;
use alerting::{AlertFeedConfig, Language};
use config::{Config, ConfigError, Environment, File};
use fallback::FallbackPolicy;
use flood_data::GeneratorConfig;
use inference_engine::SplitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "suraksha.toml";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub generator: GeneratorConfig,
    pub models: ModelsConfig,
    pub simulation: SimulationConfig,
    pub alerts: AlertsConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `data/`, `models/` and `visualization/`
    pub root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { root: PathBuf::from(".") }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Estimate used when a model artifact is missing
    pub fallback_policy: FallbackPolicy,
    pub split: SplitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Language of the alert messages logged after a run
    pub language: Language,
    pub feed: AlertFeedConfig,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            feed: AlertFeedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; without one, `suraksha.toml` is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("SURAKSHA").separator("__"))
            .build()?
            .try_deserialize()
    }
}
