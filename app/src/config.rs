//! Environment-based configuration.
//!
//! Values come from process environment variables, optionally loaded from
//! a `.env` file. Every setting has a default.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `LIVE_TODO_LOG` | `info,live_todo=debug` |
//! | `LIVE_TODO_SHUTDOWN_TIMEOUT_SECS` | `5` |
//! | `LIVE_TODO_ACTION_BUFFER` | `64` |
//! | `LIVE_TODO_METRICS` | `false` |
//! | `LIVE_TODO_SEED` | empty |

use crate::error::ConfigError;
use live_todo_runtime::StoreConfig;
use std::time::Duration;

/// Log filter used when `LIVE_TODO_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,live_todo=debug";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
    /// How long shutdown waits for in-flight effects
    pub shutdown_timeout: Duration,
    /// Capacity of the store's action broadcast channel
    pub action_buffer: usize,
    /// Install the Prometheus recorder
    pub metrics_enabled: bool,
    /// Initial contents of the in-memory backend
    pub seed: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            shutdown_timeout: Duration::from_secs(5),
            action_buffer: 64,
            metrics_enabled: false,
            seed: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparsable value.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Read configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_filter = lookup("LIVE_TODO_LOG")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let shutdown_timeout = lookup("LIVE_TODO_SHUTDOWN_TIMEOUT_SECS")
            .map(|value| parse_positive("LIVE_TODO_SHUTDOWN_TIMEOUT_SECS", &value))
            .transpose()?
            .map_or(defaults.shutdown_timeout, Duration::from_secs);

        let action_buffer = match lookup("LIVE_TODO_ACTION_BUFFER") {
            Some(value) => {
                let n = parse_positive("LIVE_TODO_ACTION_BUFFER", &value)?;
                usize::try_from(n)
                    .map_err(|e| invalid("LIVE_TODO_ACTION_BUFFER", &value, &e.to_string()))?
            },
            None => defaults.action_buffer,
        };

        let metrics_enabled = lookup("LIVE_TODO_METRICS")
            .map(|value| parse_bool("LIVE_TODO_METRICS", &value))
            .transpose()?
            .unwrap_or(defaults.metrics_enabled);

        let seed = lookup("LIVE_TODO_SEED")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            log_filter,
            shutdown_timeout,
            action_buffer,
            metrics_enabled,
            seed,
        })
    }

    /// Store settings derived from this configuration
    #[must_use]
    pub const fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.action_buffer)
    }
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(invalid(var, value, "must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(var, value, &e.to_string())),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_filter, "info,live_todo=debug");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.action_buffer, 64);
        assert!(!config.metrics_enabled);
        assert!(config.seed.is_empty());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_overrides() {
        let config = config_from(&[
            ("LIVE_TODO_LOG", "warn"),
            ("LIVE_TODO_SHUTDOWN_TIMEOUT_SECS", "12"),
            ("LIVE_TODO_ACTION_BUFFER", "8"),
            ("LIVE_TODO_METRICS", "on"),
            ("LIVE_TODO_SEED", "milk, eggs,,bread "),
        ])
        .unwrap();

        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.shutdown_timeout, Duration::from_secs(12));
        assert_eq!(config.action_buffer, 8);
        assert!(config.metrics_enabled);
        assert_eq!(config.seed, vec!["milk", "eggs", "bread"]);

        let store = config.store_config();
        assert_eq!(store.broadcast_capacity, 8);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_invalid_number() {
        let error = config_from(&[("LIVE_TODO_ACTION_BUFFER", "lots")]).unwrap_err();

        assert!(matches!(
            error,
            ConfigError::InvalidValue { var: "LIVE_TODO_ACTION_BUFFER", .. }
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_zero_timeout_rejected() {
        let error = config_from(&[("LIVE_TODO_SHUTDOWN_TIMEOUT_SECS", "0")]).unwrap_err();

        assert!(error.to_string().contains("greater than zero"));
    }

    #[test]
    fn test_invalid_bool() {
        assert!(config_from(&[("LIVE_TODO_METRICS", "maybe")]).is_err());
    }
}
