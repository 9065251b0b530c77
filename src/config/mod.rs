//! Configuration management for Combokit.
//!
//! This module holds the engine options and the settings file that the demo
//! application loads them from.

mod engine;
mod settings;

use thiserror::Error;

pub use engine::EngineConfig;
pub use settings::{DemoSettings, Settings, CONFIG_ENV_VAR};

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// The settings file could not be read.
    #[error("Failed to read configuration: {0}")]
    ReadError(#[source] std::io::Error),

    /// The settings file is not valid TOML for the expected schema.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A setting has an invalid value.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
