use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest pause, in milliseconds, any single delay or jitter may ask for.
pub const MAX_PAUSE_MS: u64 = 60_000;

/// Parameters of one producer/consumer exchange.
///
/// Every field has a default, so a config file only needs the values it
/// changes:
///
/// ```toml
/// capacity = 2
/// items = 50
/// consumer_delay_ms = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Maximum number of items waiting in the channel.
    pub capacity: usize,
    /// Items produced by each producer.
    pub items: u64,
    pub producers: usize,
    pub consumers: usize,
    pub producer_delay_ms: u64,
    pub consumer_delay_ms: u64,
    /// Upper bound of a random extra pause added to every delay.
    pub jitter_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            capacity: 3,
            items: 10,
            producers: 1,
            consumers: 1,
            producer_delay_ms: 0,
            consumer_delay_ms: 0,
            jitter_ms: 0,
        }
    }
}

impl ExchangeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid_value(
                "capacity",
                "the channel must hold at least one item",
            ));
        }
        if self.producers == 0 {
            return Err(ConfigError::invalid_value(
                "producers",
                "at least one producer is required",
            ));
        }
        if self.consumers == 0 {
            return Err(ConfigError::invalid_value(
                "consumers",
                "at least one consumer is required, otherwise producers block forever",
            ));
        }
        for (field, value) in [
            ("producer_delay_ms", self.producer_delay_ms),
            ("consumer_delay_ms", self.consumer_delay_ms),
            ("jitter_ms", self.jitter_ms),
        ] {
            if value > MAX_PAUSE_MS {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("{value} ms exceeds the {MAX_PAUSE_MS} ms limit per item"),
                ));
            }
        }
        Ok(())
    }

    pub fn total_items(&self) -> u64 {
        self.items.saturating_mul(self.producers as u64)
    }

    pub fn producer_delay(&self) -> Duration {
        Duration::from_millis(self.producer_delay_ms)
    }

    pub fn consumer_delay(&self) -> Duration {
        Duration::from_millis(self.consumer_delay_ms)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExchangeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_items(), 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExchangeConfig::from_toml_str("capacity = 1\nitems = 4\nproducers = 2").unwrap();
        assert_eq!(config.capacity, 1);
        assert_eq!(config.items, 4);
        assert_eq!(config.producers, 2);
        assert_eq!(config.consumers, 1);
        assert_eq!(config.total_items(), 8);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ExchangeConfig::from_toml_str("capacity = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "capacity",
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_pause_rejected() {
        let err = ExchangeConfig::from_toml_str("jitter_ms = 120000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "jitter_ms",
                ..
            }
        ));

        let config = ExchangeConfig {
            consumer_delay_ms: MAX_PAUSE_MS,
            ..ExchangeConfig::default()
        };
        assert!(config.validate().is_ok());
        let config = ExchangeConfig {
            producer_delay_ms: MAX_PAUSE_MS + 1,
            ..ExchangeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_consumers_rejected() {
        let config = ExchangeConfig {
            consumers: 0,
            ..ExchangeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let err = ExchangeConfig::from_toml_str("capacty = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = ExchangeConfig::from_toml_str("items = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "capacity = 5").unwrap();
        writeln!(file, "consumer_delay_ms = 2").unwrap();

        let config = ExchangeConfig::load(file.path()).unwrap();
        assert_eq!(config.capacity, 5);
        assert_eq!(config.consumer_delay(), Duration::from_millis(2));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExchangeConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
