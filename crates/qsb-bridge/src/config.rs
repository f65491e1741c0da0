//! Configuration for the bridge.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QSB_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

use qsb_codegen::QasmGenerationOptions;
use qsb_sim::DEFAULT_MAX_QUBITS;

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Simulator settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Default OpenQASM generation options
    #[serde(default)]
    pub qasm: QasmGenerationOptions,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Simulator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Maximum number of simultaneously live qubits
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,

    /// Seed used when a run does not ask for one
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_max_qubits() -> usize {
    DEFAULT_MAX_QUBITS
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Hard ceiling for `max_qubits`; 2^30 amplitudes is 16 GiB.
const MAX_QUBITS_LIMIT: usize = 30;

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            seed: None,
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

impl BridgeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: BridgeConfig = serde_yaml_ng::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::default().merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.merge_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QSB_*` overrides read through `lookup`.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("QSB_MAX_QUBITS") {
            self.simulator.max_qubits = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("QSB_MAX_QUBITS is not a number: {v}"))
            })?;
        }
        if let Some(v) = lookup("QSB_SEED") {
            let seed = v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("QSB_SEED is not a number: {v}"))
            })?;
            self.simulator.seed = Some(seed);
        }
        if let Some(v) = lookup("QSB_LOG_LEVEL") {
            self.logging.level = v;
        }
        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.max_qubits == 0 || self.simulator.max_qubits > MAX_QUBITS_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "max_qubits must be between 1 and {MAX_QUBITS_LIMIT}, got {}",
                self.simulator.max_qubits
            )));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsb_codegen::ResetBehavior;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.simulator.max_qubits, DEFAULT_MAX_QUBITS);
        assert_eq!(config.simulator.seed, None);
        assert!(config.qasm.include_qelib);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "simulator:\n  seed: 42\nqasm:\n  include_qelib: false\n  reset_behavior: ignored\n"
        )
        .unwrap();

        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.simulator.seed, Some(42));
        assert_eq!(config.simulator.max_qubits, DEFAULT_MAX_QUBITS);
        assert!(!config.qasm.include_qelib);
        assert_eq!(config.qasm.reset_behavior, ResetBehavior::Ignored);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "simulator:\n  max_qubits: 0\n").unwrap();
        assert!(matches!(
            BridgeConfig::from_file(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            BridgeConfig::from_file("/nonexistent/qsb.yaml"),
            Err(ConfigError::IoError(_))
        ));
    }

    #[test]
    fn test_merge_env_overrides() {
        let env = |key: &str| match key {
            "QSB_MAX_QUBITS" => Some("12".to_string()),
            "QSB_SEED" => Some("7".to_string()),
            "QSB_LOG_LEVEL" => Some("debug".to_string()),
            _ => None,
        };
        let config = BridgeConfig::default().merge_env(env).unwrap();
        assert_eq!(config.simulator.max_qubits, 12);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_merge_env_rejects_garbage() {
        let env = |key: &str| (key == "QSB_SEED").then(|| "abc".to_string());
        assert!(BridgeConfig::default().merge_env(env).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = BridgeConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }
}
