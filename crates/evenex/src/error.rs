//! Error types for the event bus.

use std::io;

use serde_json::Value;
use thiserror::Error;

/// Contract violations detected at a public call boundary.
///
/// Always returned to the caller, never routed through the error callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The event key is neither a string nor a symbol.
    #[error("Event name must be a string or symbol, got {found}")]
    InvalidEventKey {
        /// Kind of value that was supplied.
        found: String,
    },

    /// The handler is not invocable.
    #[error("Event handler must be a function, got {found}")]
    InvalidHandler {
        /// Kind of value that was supplied.
        found: String,
    },
}

impl ValidationError {
    pub(crate) fn invalid_key(value: &Value) -> Self {
        Self::InvalidEventKey {
            found: value_kind(value).to_owned(),
        }
    }

    pub(crate) fn invalid_handler(found: impl Into<String>) -> Self {
        Self::InvalidHandler {
            found: found.into(),
        }
    }
}

/// Name of a JSON value's type, used in validation messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A failure raised by a handler during dispatch.
///
/// Handed to the bus error callback together with the event key and handler;
/// never propagated to the `emit` caller.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// A typed handler received arguments it could not deserialize.
    #[error("invalid event payload: {0}")]
    Payload(#[source] serde_json::Error),
}

impl HandlerError {
    /// Create a failure from a message.
    #[must_use]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a failure from any error value.
    #[must_use]
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::Failed(error.to_string())
    }
}

impl From<io::Error> for HandlerError {
    fn from(error: io::Error) -> Self {
        Self::from_error(&error)
    }
}

/// Lets handlers use `?` on calls back into the bus.
impl From<ValidationError> for HandlerError {
    fn from(error: ValidationError) -> Self {
        Self::from_error(&error)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::Failed(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::Failed(message.to_owned())
    }
}

/// Result type returned by handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors from typed event helpers.
#[derive(Debug, Error)]
pub enum TypedEventError {
    /// The event could not be serialized into an argument.
    #[error("failed to serialize event '{name}': {source}")]
    Serialize {
        /// Event name.
        name: &'static str,
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The event key or handler failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// Path to the config file that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        /// Path (or source label) of the config that failed to parse.
        path: String,
        /// Underlying TOML parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation failed.
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// Field that failed validation.
        field: String,
        /// Validation failure description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::invalid_key(&json!(123));
        assert_eq!(
            err.to_string(),
            "Event name must be a string or symbol, got number"
        );

        let err = ValidationError::invalid_handler("string");
        assert_eq!(err.to_string(), "Event handler must be a function, got string");
    }

    #[test]
    fn test_handler_error_conversions() {
        let err: HandlerError = "boom".into();
        assert!(matches!(err, HandlerError::Failed(ref m) if m == "boom"));

        let io = io::Error::other("disk gone");
        let err = HandlerError::from(io);
        assert_eq!(err.to_string(), "handler failed: disk gone");

        let err = HandlerError::from(ValidationError::invalid_key(&json!(null)));
        assert_eq!(
            err.to_string(),
            "handler failed: Event name must be a string or symbol, got null"
        );
    }
}
