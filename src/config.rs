//! Configuration for the `fuzzy-fatigue` binary.
//!
//! Files are searched in order (first found wins):
//! 1. `./fuzzy-fatigue.toml`
//! 2. `<config dir>/fuzzy-fatigue/config.toml` (XDG on Linux)
//!
//! Environment overrides:
//! - `FUZZY_FATIGUE_LOG_LEVEL` - error, warn, info, debug, trace
//! - `FUZZY_FATIGUE_FORMAT` - text, json
//! - `FUZZY_FATIGUE_BREAK_THRESHOLD` - break suggestions above this are a "yes"
//!
//! ```toml
//! [general]
//! log_level = "info"
//! format = "text"
//!
//! [advisory]
//! break_threshold = 0.5
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::fatigue::DEFAULT_BREAK_THRESHOLD;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FatigueConfig {
    pub general: GeneralConfig,
    pub advisory: AdvisoryConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: LogLevel,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Break suggestions strictly above this are reported as "yes"
    pub break_threshold: f64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            break_threshold: DEFAULT_BREAK_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue("log_level", s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::InvalidValue("format", s.to_owned())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, String),

    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl FatigueConfig {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Loads `path` if given, else the first config file found. Environment
    /// overrides apply on top either way.
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::config_paths().into_iter().find(|path| path.exists()) {
                Some(path) => Self::load_from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_owned(), e.to_string()))?;

        let config: FatigueConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_owned(), e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let config: FatigueConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<string>"), e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzzy-fatigue.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("fuzzy-fatigue").join("config.toml"));
        }

        paths
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps an environment variable name to its value.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(level) = lookup("FUZZY_FATIGUE_LOG_LEVEL") {
            self.general.log_level = level.parse()?;
        }

        if let Some(format) = lookup("FUZZY_FATIGUE_FORMAT") {
            self.general.format = format.parse()?;
        }

        if let Some(threshold) = lookup("FUZZY_FATIGUE_BREAK_THRESHOLD") {
            self.advisory.break_threshold = threshold
                .parse()
                .map_err(|_| ConfigError::InvalidValue("break_threshold", threshold.clone()))?;
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0. ..=1.).contains(&self.advisory.break_threshold) {
            return Err(ConfigError::InvalidValue(
                "break_threshold",
                self.advisory.break_threshold.to_string(),
            ));
        }

        Ok(())
    }
}

#[test]
fn test_defaults() {
    let config = FatigueConfig::default();

    assert_eq!(config.general.log_level, LogLevel::Warn);
    assert_eq!(config.general.format, OutputFormat::Text);
    assert_eq!(config.advisory.break_threshold, 0.5);
}

#[test]
fn test_load_from_str() {
    let config = FatigueConfig::load_from_str(
        r#"
        [general]
        log_level = "debug"

        [advisory]
        break_threshold = 0.7
        "#,
    )
    .unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.general.format, OutputFormat::Text);
    assert_eq!(config.advisory.break_threshold, 0.7);

    assert!(matches!(
        FatigueConfig::load_from_str("[advisory]\nbreak_threshold = 2.0"),
        Err(ConfigError::InvalidValue("break_threshold", _))
    ));
    assert!(matches!(
        FatigueConfig::load_from_str("[general]\nformat = \"xml\""),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn test_overrides() {
    let mut config = FatigueConfig::default();

    config
        .apply_overrides(|key| match key {
            "FUZZY_FATIGUE_LOG_LEVEL" => Some("TRACE".to_owned()),
            "FUZZY_FATIGUE_FORMAT" => Some("json".to_owned()),
            "FUZZY_FATIGUE_BREAK_THRESHOLD" => Some("0.25".to_owned()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.general.log_level, LogLevel::Trace);
    assert_eq!(config.general.format, OutputFormat::Json);
    assert_eq!(config.advisory.break_threshold, 0.25);

    assert!(matches!(
        config.apply_overrides(|key| (key == "FUZZY_FATIGUE_BREAK_THRESHOLD").then(|| "lots".to_owned())),
        Err(ConfigError::InvalidValue("break_threshold", value)) if value == "lots"
    ));
}

#[test]
fn test_overrides_apply_on_top_of_file() {
    let mut config = FatigueConfig::load_from_str(
        r#"
        [general]
        format = "json"

        [advisory]
        break_threshold = 0.3
        "#,
    )
    .unwrap();

    config
        .apply_overrides(|key| (key == "FUZZY_FATIGUE_BREAK_THRESHOLD").then(|| "0.9".to_owned()))
        .unwrap();

    assert_eq!(config.advisory.break_threshold, 0.9);
    assert_eq!(config.general.format, OutputFormat::Json);
    assert_eq!(config.general.log_level, LogLevel::Warn);
}

#[test]
fn test_load_with_explicit_path() {
    let path = env::temp_dir().join(format!("fuzzy-fatigue-{}.toml", std::process::id()));

    fs::write(&path, "[advisory]\nbreak_threshold = 0.8\n").unwrap();

    let loaded = FatigueConfig::load_with(Some(&path));

    fs::remove_file(&path).unwrap();

    // Nothing in the test environment sets FUZZY_FATIGUE_*
    assert_eq!(loaded.unwrap().advisory.break_threshold, 0.8);
    assert!(matches!(
        FatigueConfig::load_with(Some(Path::new("/nonexistent/fuzzy-fatigue.toml"))),
        Err(ConfigError::Io(..))
    ));
}
