//! Combobox engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};
use crate::engine::parser::{BulkCreateParser, DEFAULT_SEPARATORS};
use crate::engine::search::DEFAULT_DEBOUNCE_MS;
use crate::engine::Mode;

/// Options recognised by the combobox engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Single or multiple selection.
    pub mode: Mode,
    /// Pass the option list through unfiltered; the caller filters.
    pub disabled_options_filter: bool,
    /// Allow creating options from the search text.
    pub creatable: bool,
    /// Separators used to split text for bulk creation.
    pub create_separators: Vec<String>,
    /// Trim created names.
    pub trim_on_create: bool,
    /// Delay before a typed query is searched.
    pub search_debounce_ms: u64,
    /// Whether the search callback completes asynchronously.
    pub async_search: bool,
    /// Keep the search text when the input loses focus.
    pub keep_search_text_on_blur: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Single,
            disabled_options_filter: false,
            creatable: false,
            create_separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            trim_on_create: true,
            search_debounce_ms: DEFAULT_DEBOUNCE_MS,
            async_search: false,
            keep_search_text_on_blur: false,
        }
    }
}

impl EngineConfig {
    /// Configuration for a multiple-selection combobox.
    pub fn multiple() -> Self {
        Self::default().with_mode(Mode::Multiple)
    }

    /// Set the selection mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable creation.
    pub fn with_creatable(mut self, creatable: bool) -> Self {
        self.creatable = creatable;
        self
    }

    /// Set the creation separators.
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.create_separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable trimming of created names.
    pub fn with_trim_on_create(mut self, trim: bool) -> Self {
        self.trim_on_create = trim;
        self
    }

    /// Set the search debounce delay in milliseconds.
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.search_debounce_ms = ms;
        self
    }

    /// Mark the search callback as asynchronous.
    pub fn with_async_search(mut self, async_search: bool) -> Self {
        self.async_search = async_search;
        self
    }

    /// Keep or drop the search text on blur.
    pub fn with_keep_search_text_on_blur(mut self, keep: bool) -> Self {
        self.keep_search_text_on_blur = keep;
        self
    }

    /// Disable built-in filtering of the option list.
    pub fn with_disabled_options_filter(mut self, disabled: bool) -> Self {
        self.disabled_options_filter = disabled;
        self
    }

    /// The debounce delay as a duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Build the bulk-create parser for this configuration.
    pub fn parser(&self) -> BulkCreateParser {
        BulkCreateParser::new(self.create_separators.clone(), self.trim_on_create)
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if a separator is empty.
    pub fn validate(&self) -> Result<()> {
        if self.create_separators.iter().any(String::is_empty) {
            return Err(ConfigError::ValidationError(
                "create_separators cannot contain an empty string".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.mode, Mode::Single);
        assert!(!config.disabled_options_filter);
        assert!(!config.creatable);
        assert_eq!(config.create_separators, vec![",", "+", "\n"]);
        assert!(config.trim_on_create);
        assert_eq!(config.search_debounce_ms, 300);
        assert!(!config.async_search);
        assert!(!config.keep_search_text_on_blur);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::multiple()
            .with_creatable(true)
            .with_separators([";"])
            .with_debounce_ms(50)
            .with_async_search(true);
        assert_eq!(config.mode, Mode::Multiple);
        assert!(config.creatable);
        assert_eq!(config.create_separators, vec![";"]);
        assert_eq!(config.debounce(), Duration::from_millis(50));
        assert!(config.async_search);
    }

    #[test]
    fn test_validate_rejects_empty_separator() {
        let config = EngineConfig::default().with_separators([",", ""]);
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
            mode = "multiple"
            creatable = true
            "#,
        )
        .unwrap();
        assert_eq!(config.mode, Mode::Multiple);
        assert!(config.creatable);
        assert_eq!(config.search_debounce_ms, 300);
    }
}
