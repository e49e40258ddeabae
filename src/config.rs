//! Configuration management for the circulation engine

use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

use crate::error::AppResult;

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ShellConfig {
    /// Echo each command before its result
    pub echo_commands: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrencyConfig {
    pub symbol: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub shell: ShellConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> AppResult<Self> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (e.g. ELIDUNE_LOGGING__LEVEL)
            .add_source(
                Environment::with_prefix("ELIDUNE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            echo_commands: false,
        }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "$".to_string(),
        }
    }
}
