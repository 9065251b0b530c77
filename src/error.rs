//! Centralized error types for Combokit.
//!
//! This module provides a unified error hierarchy for the application with
//! user-friendly error messages. All error types use `thiserror` for
//! ergonomic error handling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::SearchError;

/// The main application error type.
///
/// This enum aggregates all error types that can occur in Combokit,
/// providing user-friendly error messages while preserving the underlying
/// error context for debugging.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Search callback failures.
    #[error("{0}")]
    Search(#[from] SearchError),

    /// IO errors (file system, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Option file could not be parsed.
    #[error("Invalid options file: {0}")]
    Options(String),

    /// Terminal-related errors.
    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl AppError {
    /// Create a terminal error.
    pub fn terminal(msg: impl Into<String>) -> Self {
        AppError::Terminal(msg.into())
    }

    /// Create an options file error.
    pub fn options(msg: impl Into<String>) -> Self {
        AppError::Options(msg.into())
    }

    /// Get a user-friendly message for display.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => match e {
                ConfigError::NoConfigDir => {
                    "Could not find configuration directory. Please check your system settings."
                        .to_string()
                }
                ConfigError::ReadError(_) => {
                    "Could not read configuration file. Please check the file is readable."
                        .to_string()
                }
                ConfigError::ParseError(_) => {
                    "Configuration file is invalid. Please check the file format.".to_string()
                }
                ConfigError::ValidationError(msg) => format!("Configuration error: {}", msg),
            },
            AppError::Search(SearchError::Failed(msg)) => format!("Search failed: {}", msg),
            AppError::Search(SearchError::Cancelled) => "Search was cancelled.".to_string(),
            AppError::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
            AppError::Options(msg) => format!("Could not load options: {}", msg),
            AppError::Terminal(msg) => format!("Terminal error: {}", msg),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// A failed search is retried naturally by the next keystroke.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Search(_))
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
