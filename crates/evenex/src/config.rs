//! TOML configuration for a bus.
//!
//! A config document either holds the keys at the top level:
//!
//! ```toml
//! debug = true
//! max_listeners = 10
//! ```
//!
//! or nests them under a `[bus]` table, so the bus settings can live inside
//! a larger application config file. Missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Largest accepted config file, in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Upper bound accepted for `max_listeners`.
pub const MAX_LISTENERS_UPPER_BOUND: usize = 1_000_000;

/// Name of the table holding bus settings in a larger document.
const BUS_TABLE: &str = "bus";

/// Serializable bus settings.
///
/// The error callback is code, not data, so it is not part of the config;
/// converting into [`BusOptions`](crate::BusOptions) installs the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Log every bus operation at debug level.
    pub debug: bool,
    /// Listener warning threshold per key (0 = unlimited).
    pub max_listeners: usize,
}

impl BusConfig {
    /// Parse a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for malformed TOML or mistyped
    /// fields, and [`ConfigError::ValidationError`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        parse(content, "<string>")
    }

    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read, or any
    /// error from [`BusConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        // Check size after reading to avoid TOCTOU between stat and read.
        if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::ValidationError {
                field: path.display().to_string(),
                message: format!(
                    "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                    content.len()
                ),
            });
        }

        let config = parse(&content, &path.display().to_string())?;
        debug!(path = %path.display(), "loaded bus config");
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_listeners > MAX_LISTENERS_UPPER_BOUND {
            return Err(ConfigError::ValidationError {
                field: "max_listeners".to_owned(),
                message: format!(
                    "max_listeners ({}) exceeds maximum allowed value ({MAX_LISTENERS_UPPER_BOUND})",
                    self.max_listeners
                ),
            });
        }
        Ok(())
    }
}

fn parse(content: &str, origin: &str) -> ConfigResult<BusConfig> {
    let parse_err = |e| ConfigError::ParseError {
        path: origin.to_owned(),
        source: e,
    };

    let mut document: toml::Value = toml::from_str(content).map_err(parse_err)?;

    let section = match document.as_table_mut().and_then(|t| t.remove(BUS_TABLE)) {
        Some(section @ toml::Value::Table(_)) => section,
        Some(other) => {
            return Err(ConfigError::ValidationError {
                field: BUS_TABLE.to_owned(),
                message: format!("expected a table, found {}", other.type_str()),
            });
        },
        None => document,
    };

    let config: BusConfig = section.try_into().map_err(parse_err)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = BusConfig::from_toml_str("").unwrap();
        assert_eq!(config, BusConfig::default());
    }

    #[test]
    fn test_flat_keys() {
        let config = BusConfig::from_toml_str("debug = true\nmax_listeners = 10\n").unwrap();
        assert!(config.debug);
        assert_eq!(config.max_listeners, 10);
    }

    #[test]
    fn test_bus_table() {
        let toml = r#"
            [app]
            name = "demo"

            [bus]
            max_listeners = 3
        "#;
        let config = BusConfig::from_toml_str(toml).unwrap();
        assert!(!config.debug);
        assert_eq!(config.max_listeners, 3);
    }

    #[test]
    fn test_bus_key_must_be_table() {
        let err = BusConfig::from_toml_str("bus = 5").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "bus"));
    }

    #[test]
    fn test_malformed_toml() {
        let err = BusConfig::from_toml_str("debug = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_wrong_type() {
        let err = BusConfig::from_toml_str("max_listeners = \"ten\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_out_of_range() {
        let err = BusConfig::from_toml_str("max_listeners = 2000000").unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "max_listeners")
        );
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bus]\ndebug = true").unwrap();

        let config = BusConfig::load(file.path()).unwrap();
        assert!(config.debug);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BusConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_load_oversized_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let padding = "#".repeat(70 * 1024);
        writeln!(file, "{padding}").unwrap();

        let err = BusConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
