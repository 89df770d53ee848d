//! Argument validation at the public call boundary.
//!
//! Statically typed keys and handlers are valid by construction. These checks
//! cover the dynamic paths, where a caller forwards untyped values (for
//! example a JSON message naming the event) into the bus.

use serde_json::Value;

use crate::error::{ValidationError, value_kind};
use crate::handler::Handler;

/// Check that a dynamic value can name an event, returning the name.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidEventKey`] for any non-string value.
pub fn validate_event_key(value: &Value) -> Result<&str, ValidationError> {
    value
        .as_str()
        .ok_or_else(|| ValidationError::invalid_key(value))
}

/// Check that a handler argument is present.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidHandler`] when no handler was supplied.
pub fn validate_handler(handler: Option<&Handler>) -> Result<&Handler, ValidationError> {
    handler.ok_or_else(|| ValidationError::invalid_handler("none"))
}

/// Check a dynamic value offered as a handler.
///
/// JSON values are data, never invocable.
///
/// # Errors
///
/// Always returns [`ValidationError::InvalidHandler`].
pub fn validate_handler_value(value: &Value) -> Result<Handler, ValidationError> {
    Err(ValidationError::invalid_handler(value_kind(value)))
}
