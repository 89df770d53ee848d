//! Event keys: string names and identity-compared symbols.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::validate::validate_event_key;

/// A symbolic event token.
///
/// Every call to [`Symbol::new`] produces a distinct token. Clones of a
/// symbol compare equal; two symbols created with the same description do
/// not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: Uuid,
    description: Option<Arc<str>>,
}

impl Symbol {
    /// Create a new unique symbol with a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: Some(Arc::from(description.into())),
        }
    }

    /// Create a new unique symbol without a description.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: None,
        }
    }

    /// The description given at creation, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or_default())
    }
}

/// Identifier of an event category.
///
/// Names compare by value, symbols by identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// A string event name.
    Name(String),
    /// A symbolic token.
    Symbol(Symbol),
}

impl EventKey {
    /// The string name, if this key is a name.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Symbol(_) => None,
        }
    }

    /// Returns `true` if this key is a symbol.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => fmt::Display::fmt(symbol, f),
        }
    }
}

impl From<&str> for EventKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<&Symbol> for EventKey {
    fn from(symbol: &Symbol) -> Self {
        Self::Symbol(symbol.clone())
    }
}

impl PartialEq<str> for EventKey {
    fn eq(&self, other: &str) -> bool {
        self.as_name() == Some(other)
    }
}

impl PartialEq<&str> for EventKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_name() == Some(*other)
    }
}

/// Conversion of caller-supplied values into an [`EventKey`].
///
/// Statically typed keys always convert. Dynamic JSON values are checked
/// and only strings are accepted.
pub trait IntoEventKey {
    /// Convert into an event key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidEventKey`] if the value is neither a
    /// string nor a symbol.
    fn into_event_key(self) -> Result<EventKey, ValidationError>;
}

impl IntoEventKey for EventKey {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(self)
    }
}

impl IntoEventKey for &EventKey {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(self.clone())
    }
}

impl IntoEventKey for &str {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(EventKey::from(self))
    }
}

impl IntoEventKey for String {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(EventKey::Name(self))
    }
}

impl IntoEventKey for &String {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(EventKey::Name(self.clone()))
    }
}

impl IntoEventKey for Symbol {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(EventKey::Symbol(self))
    }
}

impl IntoEventKey for &Symbol {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        Ok(EventKey::Symbol(self.clone()))
    }
}

impl IntoEventKey for &Value {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        validate_event_key(self).map(|name| EventKey::Name(name.to_owned()))
    }
}

impl IntoEventKey for Value {
    fn into_event_key(self) -> Result<EventKey, ValidationError> {
        (&self).into_event_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_symbols_compare_by_identity() {
        let a = Symbol::new("ready");
        let b = Symbol::new("ready");

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(EventKey::from(&a), EventKey::Symbol(a.clone()));
        assert_ne!(EventKey::from(a), EventKey::from(b));
    }

    #[test]
    fn test_names_compare_by_value() {
        let a = EventKey::from("ready");
        let b = EventKey::from(String::from("ready"));

        assert_eq!(a, b);
        assert_eq!(a, "ready");

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(EventKey::from("user:login").to_string(), "user:login");
        assert_eq!(EventKey::from(Symbol::new("tick")).to_string(), "Symbol(tick)");
        assert_eq!(Symbol::anonymous().to_string(), "Symbol()");
    }

    #[test]
    fn test_dynamic_string_key_accepted() {
        let key = json!("test").into_event_key().unwrap();
        assert_eq!(key, "test");

        let value = json!("borrowed");
        let key = (&value).into_event_key().unwrap();
        assert_eq!(key, "borrowed");
    }

    #[test]
    fn test_dynamic_non_string_key_rejected() {
        for value in [json!(123), json!(null), json!(true), json!([]), json!({})] {
            let err = value.into_event_key().unwrap_err();
            assert!(matches!(err, ValidationError::InvalidEventKey { .. }));
            assert!(
                err.to_string()
                    .starts_with("Event name must be a string or symbol")
            );
        }
    }
}
