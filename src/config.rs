//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub c: CConfig,

    #[serde(default)]
    pub promela: PromelaConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Width of one slot in the run-time state vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotWidth {
    #[default]
    U8,
    U16,
    U32,
}

impl SlotWidth {
    /// Largest value a slot can hold
    pub fn limit(&self) -> usize {
        match self {
            SlotWidth::U8 => u8::MAX as usize,
            SlotWidth::U16 => u16::MAX as usize,
            SlotWidth::U32 => u32::MAX as usize,
        }
    }

    /// C type used for one slot
    pub fn c_type(&self) -> &'static str {
        match self {
            SlotWidth::U8 => "unsigned char",
            SlotWidth::U16 => "unsigned short",
            SlotWidth::U32 => "unsigned int",
        }
    }
}

/// State-vector encoding settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EncodingConfig {
    #[serde(default)]
    pub slot_width: SlotWidth,
}

/// C dispatcher backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CConfig {
    /// C type of the event argument of the exec function
    #[serde(default = "default_event_type")]
    pub event_type: String,

    /// Wrap a guarded transition in `if (guard)`
    #[serde(default = "default_true")]
    pub guards: bool,
}

/// Promela backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromelaConfig {
    /// Capacity of each chart's event channel
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_event_type() -> String {
    "evt_t".to_string()
}

fn default_true() -> bool {
    true
}

fn default_queue_depth() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for CConfig {
    fn default() -> Self {
        Self {
            event_type: default_event_type(),
            guards: default_true(),
        }
    }
}

impl Default for PromelaConfig {
    fn default() -> Self {
        Self {
            queue_depth: default_queue_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./statekit.toml
    /// 2. ~/.statekit/config.toml
    /// 3. /etc/statekit/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("statekit.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".statekit").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/statekit/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn validate(&self) -> Result<()> {
        if self.promela.queue_depth == 0 {
            return Err(Error::Config(
                "promela.queue_depth must be at least 1".to_string(),
            ));
        }
        if self.c.event_type.trim().is_empty() {
            return Err(Error::Config("c.event_type cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.encoding.slot_width, SlotWidth::U8);
        assert_eq!(config.c.event_type, "evt_t");
        assert!(config.c.guards);
        assert_eq!(config.promela.queue_depth, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[encoding]
slot_width = "u16"

[c]
event_type = "int"

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.encoding.slot_width, SlotWidth::U16);
        assert_eq!(config.c.event_type, "int");
        assert!(config.c.guards);
        assert_eq!(config.promela.queue_depth, 4);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_slot_width_limits() {
        assert_eq!(SlotWidth::U8.limit(), 255);
        assert_eq!(SlotWidth::U16.limit(), 65535);
        assert_eq!(SlotWidth::U8.c_type(), "unsigned char");
    }

    #[test]
    fn test_validate_rejects_zero_queue() {
        let mut config = Config::default();
        config.promela.queue_depth = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
