//! Configuration management for grouptree
//!
//! Configuration starts from defaults and can be overridden from environment
//! variables or loaded from a TOML file. Every entry point validates the
//! result before handing it out.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Upper bound for `max_depth`: tree rendering keeps one indent bit per level
pub const MAX_SUPPORTED_DEPTH: usize = 64;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hierarchy limits and behaviour
    pub hierarchy: HierarchyConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Hierarchy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Maximum number of live nodes; `create` fails beyond it
    pub max_nodes: usize,

    /// Maximum number of live root lists; `new_list` fails beyond it
    pub max_lists: usize,

    /// Maximum nesting depth of groups
    pub max_depth: usize,

    /// Reject appends whose name already exists among the siblings
    pub unique_names: bool,

    /// Report rendered tree lines to the observer while building snapshots
    pub trace_tree: bool,

    /// Lock waits at least this long are reported to the observer
    #[serde(with = "humantime_serde")]
    pub contention_warn_after: Duration,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Mirror hierarchy counters to the `metrics` facade
    pub enabled: bool,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            max_lists: 1024,
            max_depth: 32,
            unique_names: true,
            trace_tree: true,
            contention_warn_after: Duration::from_millis(50),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn parse_var<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue { key, reason: e.to_string() })
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: GROUPTREE_<SECTION>_<KEY>
    /// Example: GROUPTREE_HIERARCHY_MAX_DEPTH=16
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Hierarchy config
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_MAX_NODES") {
            config.hierarchy.max_nodes = parse_var("GROUPTREE_HIERARCHY_MAX_NODES", &raw)?;
        }
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_MAX_LISTS") {
            config.hierarchy.max_lists = parse_var("GROUPTREE_HIERARCHY_MAX_LISTS", &raw)?;
        }
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_MAX_DEPTH") {
            config.hierarchy.max_depth = parse_var("GROUPTREE_HIERARCHY_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_UNIQUE_NAMES") {
            config.hierarchy.unique_names = parse_var("GROUPTREE_HIERARCHY_UNIQUE_NAMES", &raw)?;
        }
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_TRACE_TREE") {
            config.hierarchy.trace_tree = parse_var("GROUPTREE_HIERARCHY_TRACE_TREE", &raw)?;
        }
        if let Some(raw) = lookup("GROUPTREE_HIERARCHY_CONTENTION_WARN_AFTER") {
            config.hierarchy.contention_warn_after =
                humantime_serde::re::humantime::parse_duration(&raw).map_err(|e| {
                    ConfigError::InvalidValue {
                        key: "GROUPTREE_HIERARCHY_CONTENTION_WARN_AFTER",
                        reason: e.to_string(),
                    }
                })?;
        }

        // Logging config
        if let Some(level) = lookup("GROUPTREE_LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }
        if let Some(raw) = lookup("GROUPTREE_LOG_JSON") {
            config.logging.json_format = parse_var("GROUPTREE_LOG_JSON", &raw)?;
        }

        // Metrics config
        if let Some(raw) = lookup("GROUPTREE_METRICS_ENABLED") {
            config.metrics.enabled = parse_var("GROUPTREE_METRICS_ENABLED", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hierarchy.validate()?;

        if self.logging.level.parse::<LogLevel>().is_err() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

impl HierarchyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nodes == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_nodes must be greater than 0".to_string(),
            ));
        }

        if self.max_lists == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_lists must be greater than 0".to_string(),
            ));
        }

        if self.max_depth == 0 || self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(ConfigError::ValidationFailed(format!(
                "max_depth must be between 1 and {}",
                MAX_SUPPORTED_DEPTH
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hierarchy.max_depth, 32);
        assert!(config.hierarchy.unique_names);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.hierarchy.max_nodes = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.hierarchy.max_depth = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.hierarchy.max_depth = MAX_SUPPORTED_DEPTH + 1;
        assert!(config.validate().is_err());

        config = Config::default();
        config.hierarchy.max_depth = MAX_SUPPORTED_DEPTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());

        // Every spelling the logger accepts passes validation
        for level in ["warning", "WARN", "Error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{} should be accepted", level);
        }
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("GROUPTREE_HIERARCHY_MAX_DEPTH", "8"),
            ("GROUPTREE_HIERARCHY_UNIQUE_NAMES", "false"),
            ("GROUPTREE_HIERARCHY_CONTENTION_WARN_AFTER", "250ms"),
            ("GROUPTREE_LOG_LEVEL", "DEBUG"),
            ("GROUPTREE_METRICS_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.hierarchy.max_depth, 8);
        assert!(!config.hierarchy.unique_names);
        assert_eq!(config.hierarchy.contention_warn_after, Duration::from_millis(250));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("GROUPTREE_HIERARCHY_MAX_NODES", "lots")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { key: "GROUPTREE_HIERARCHY_MAX_NODES", .. }
        ));

        let err = Config::from_lookup(lookup_from(&[("GROUPTREE_HIERARCHY_MAX_DEPTH", "65")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grouptree.toml");

        let mut config = Config::default();
        config.hierarchy.max_nodes = 500;
        config.hierarchy.contention_warn_after = Duration::from_secs(2);
        config.logging.json_format = true;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[hierarchy]\nmax_depth = 4\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.hierarchy.max_depth, 4);
        assert_eq!(loaded.hierarchy.max_nodes, HierarchyConfig::default().max_nodes);
        assert_eq!(loaded.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/grouptree.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError(_)));
    }
}
