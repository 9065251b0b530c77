//! Settings file loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConfigError, EngineConfig, Result};

/// Environment variable that overrides the settings file path.
pub const CONFIG_ENV_VAR: &str = "COMBOKIT_CONFIG";

/// Settings for the demo application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Simulated latency of the asynchronous search, in milliseconds.
    pub latency_ms: u64,
    /// Event loop tick rate in milliseconds.
    pub tick_rate_ms: u64,
    /// Title shown above the combobox.
    pub title: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            latency_ms: 400,
            tick_rate_ms: 50,
            title: "Combokit".to_string(),
        }
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine options.
    pub engine: EngineConfig,
    /// Demo application options.
    pub demo: DemoSettings,
}

impl Settings {
    /// Load settings from the default location.
    ///
    /// The path comes from `COMBOKIT_CONFIG` if set, otherwise
    /// `<config dir>/combokit/config.toml`. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load settings from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let settings: Settings =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.engine.validate()?;

        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// The settings file path.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("combokit").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Mode;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[engine]
mode = "multiple"
creatable = true
create_separators = [";"]

[demo]
latency_ms = 10
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.engine.mode, Mode::Multiple);
        assert!(settings.engine.creatable);
        assert_eq!(settings.engine.create_separators, vec![";"]);
        assert_eq!(settings.demo.latency_ms, 10);
        assert_eq!(settings.demo.tick_rate_ms, 50);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "engine = [").unwrap();
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_separator_fails_validation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[engine]\ncreate_separators = [\"\"]").unwrap();
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_var_overrides_path() {
        std::env::set_var(CONFIG_ENV_VAR, "/tmp/combokit-test.toml");
        let path = Settings::default_path().unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);
        assert_eq!(path, PathBuf::from("/tmp/combokit-test.toml"));
    }
}
