//! Configuration management for deptrace
//!
//! Settings load from environment variables with sensible defaults; CLI
//! arguments override them per invocation.
//!
//! # Environment Variables
//!
//! - `DEPTRACE_TRACE_LOG`: trace log location - default: "trace.log"
//! - `DEPTRACE_PATHS_LOG`: paths log location - default: "paths.log"
//! - `DEPTRACE_PYTHON`: interpreter used for search-root and registry
//!   probes - default: "python3"
//! - `DEPTRACE_STRACE_STRING_LIMIT`: tracer string argument limit -
//!   default: "9999999"
//! - `DEPTRACE_LOG_LEVEL`: logging level - default: "info"

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_TRACE_LOG: &str = "trace.log";
const DEFAULT_PATHS_LOG: &str = "paths.log";
const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_STRING_LIMIT: u32 = 9_999_999;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for deptrace
///
/// Constructed via `Default::default()`, which reads `DEPTRACE_*` variables
/// and falls back to defaults for anything missing or unparsable.
#[derive(Debug, Clone)]
pub struct DeptraceConfig {
    /// Trace log location (cache artifact, regenerable)
    pub trace_log: PathBuf,

    /// Paths log location (cache artifact, regenerable)
    pub paths_log: PathBuf,

    /// Interpreter used for module search-root and registry probes
    pub python: String,

    /// Tracer string argument limit
    pub string_limit: u32,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for DeptraceConfig {
    fn default() -> Self {
        let trace_log = env::var("DEPTRACE_TRACE_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TRACE_LOG));

        let paths_log = env::var("DEPTRACE_PATHS_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PATHS_LOG));

        let python = env::var("DEPTRACE_PYTHON").unwrap_or_else(|_| DEFAULT_PYTHON.to_string());

        let string_limit = env::var("DEPTRACE_STRACE_STRING_LIMIT")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_STRING_LIMIT);

        let log_level = env::var("DEPTRACE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            trace_log,
            paths_log,
            python,
            string_limit,
            log_level,
        }
    }
}

impl DeptraceConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.string_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "Tracer string limit must be at least 1".to_string(),
            ));
        }

        if self.python.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Interpreter name cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }
}

impl fmt::Display for DeptraceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deptrace Configuration:")?;
        writeln!(f, "  Trace Log: {}", self.trace_log.display())?;
        writeln!(f, "  Paths Log: {}", self.paths_log.display())?;
        writeln!(f, "  Python: {}", self.python)?;
        writeln!(f, "  String Limit: {}", self.string_limit)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("DEPTRACE_TRACE_LOG"),
            EnvGuard::unset("DEPTRACE_PATHS_LOG"),
            EnvGuard::unset("DEPTRACE_PYTHON"),
            EnvGuard::unset("DEPTRACE_STRACE_STRING_LIMIT"),
            EnvGuard::unset("DEPTRACE_LOG_LEVEL"),
        ];

        let config = DeptraceConfig::default();

        assert_eq!(config.trace_log, PathBuf::from(DEFAULT_TRACE_LOG));
        assert_eq!(config.paths_log, PathBuf::from(DEFAULT_PATHS_LOG));
        assert_eq!(config.python, DEFAULT_PYTHON);
        assert_eq!(config.string_limit, DEFAULT_STRING_LIMIT);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("DEPTRACE_TRACE_LOG", "/var/log/run.trace"),
            EnvGuard::set("DEPTRACE_PYTHON", "python3.11"),
            EnvGuard::set("DEPTRACE_STRACE_STRING_LIMIT", "4096"),
            EnvGuard::set("DEPTRACE_LOG_LEVEL", "DEBUG"),
        ];

        let config = DeptraceConfig::default();

        assert_eq!(config.trace_log, PathBuf::from("/var/log/run.trace"));
        assert_eq!(config.python, "python3.11");
        assert_eq!(config.string_limit, 4096);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_unparsable_limit_falls_back() {
        let _guard = EnvGuard::set("DEPTRACE_STRACE_STRING_LIMIT", "not-a-number");

        let config = DeptraceConfig::default();
        assert_eq!(config.string_limit, DEFAULT_STRING_LIMIT);
    }

    fn explicit_config() -> DeptraceConfig {
        DeptraceConfig {
            trace_log: PathBuf::from("trace.log"),
            paths_log: PathBuf::from("paths.log"),
            python: "python3".to_string(),
            string_limit: 9_999_999,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_validation_accepts_defaults() {
        assert!(explicit_config().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_limit() {
        let config = DeptraceConfig {
            string_limit: 0,
            ..explicit_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let config = DeptraceConfig {
            log_level: "loud".to_string(),
            ..explicit_config()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_config_display() {
        let _guard = EnvGuard::unset("DEPTRACE_LOG_LEVEL");

        let config = DeptraceConfig::default();
        let display = format!("{config}");
        assert!(display.contains("Deptrace Configuration:"));
        assert!(display.contains("Trace Log:"));
    }
}
