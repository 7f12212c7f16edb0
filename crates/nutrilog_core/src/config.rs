//! Runtime configuration for tracker entry points.
//!
//! # Responsibility
//! - Resolve data directory, log level and log directory from environment
//!   variables with caller overrides.
//!
//! # Invariants
//! - `log_level` is always a normalized level accepted by `init_logging`.
//! - Without an explicit log directory, logs go to `<data_dir>/logs`.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "NUTRILOG_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "NUTRILOG_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NUTRILOG_LOG_DIR";

const DEFAULT_DATA_DIR: &str = ".";
const LOG_SUBDIR: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    CurrentDir(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::CurrentDir(message) => {
                write!(f, "cannot resolve current directory: {message}")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub data_dir: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl TrackerConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, so callers and tests can supply
    /// their own variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = non_blank(ENV_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let log_level = match non_blank(ENV_LOG_LEVEL) {
            Some(value) => normalize_level(&value).map_err(ConfigError::InvalidLogLevel)?,
            None => default_log_level(),
        };
        let log_dir = non_blank(ENV_LOG_DIR).map(PathBuf::from);

        Ok(Self {
            data_dir,
            log_level,
            log_dir,
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(self)
    }

    /// Log directory as an absolute path, as required by `init_logging`.
    pub fn absolute_log_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_SUBDIR));
        absolutize(&dir)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let current = std::env::current_dir().map_err(|err| ConfigError::CurrentDir(err.to_string()))?;
    Ok(current.join(path))
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, TrackerConfig, ENV_DATA_DIR, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
        assert!(config.absolute_log_dir().unwrap().is_absolute());
    }

    #[test]
    fn environment_values_are_normalized() {
        let config = TrackerConfig::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/var/lib/nutrilog"),
            (ENV_LOG_LEVEL, "Warning"),
            (ENV_LOG_DIR, "/var/log/nutrilog"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/nutrilog"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(
            config.absolute_log_dir().unwrap(),
            PathBuf::from("/var/log/nutrilog")
        );
    }

    #[test]
    fn invalid_level_is_rejected() {
        let err = TrackerConfig::from_lookup(lookup(&[(ENV_LOG_LEVEL, "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn default_log_dir_lives_under_data_dir() {
        let config = TrackerConfig::from_lookup(lookup(&[(ENV_DATA_DIR, "/srv/food")])).unwrap();
        assert_eq!(
            config.absolute_log_dir().unwrap(),
            PathBuf::from("/srv/food/logs")
        );
    }
}
