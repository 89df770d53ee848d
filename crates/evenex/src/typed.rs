//! Typed events on top of the dynamic bus.
//!
//! An [`Event`] type fixes the key and argument shape of one event, so
//! emitters and handlers agree at compile time. The event travels as a single
//! JSON argument, so untyped handlers on the same key still see it.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::bus::EventBus;
use crate::error::{HandlerError, HandlerResult, TypedEventError, ValidationError};
use crate::handler::{Handler, Invocation};

/// An event with a fixed name and payload type.
///
/// ```rust
/// use evenex::{Event, EventBus};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct UserLogin {
///     user_id: String,
/// }
///
/// impl Event for UserLogin {
///     const NAME: &'static str = "user:login";
/// }
///
/// let bus = EventBus::new();
/// bus.on_event(|login: UserLogin, _| {
///     assert_eq!(login.user_id, "user123");
///     Ok(())
/// })
/// .unwrap();
///
/// assert!(bus.emit_event(&UserLogin { user_id: "user123".into() }).unwrap());
/// ```
pub trait Event: Serialize + DeserializeOwned + 'static {
    /// Event key used on the bus.
    const NAME: &'static str;
}

impl EventBus {
    /// Serialize `event` and emit it under [`Event::NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`TypedEventError::Serialize`] if the event cannot be
    /// converted to JSON.
    pub fn emit_event<E: Event>(&self, event: &E) -> Result<bool, TypedEventError> {
        let payload = serde_json::to_value(event).map_err(|source| TypedEventError::Serialize {
            name: E::NAME,
            source,
        })?;
        Ok(self.emit(E::NAME, &[payload])?)
    }

    /// Subscribe a typed handler. Returns the handler so it can be removed
    /// with [`EventBus::off`].
    ///
    /// A payload that does not deserialize into `E` is reported to the error
    /// callback as [`HandlerError::Payload`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if registration fails.
    pub fn on_event<E, F>(&self, f: F) -> Result<Handler, ValidationError>
    where
        E: Event,
        F: Fn(E, &Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = typed_handler(f);
        self.on(E::NAME, &handler)?;
        Ok(handler)
    }

    /// Subscribe a typed handler for the next emit only.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if registration fails.
    pub fn once_event<E, F>(&self, f: F) -> Result<Handler, ValidationError>
    where
        E: Event,
        F: Fn(E, &Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = typed_handler(f);
        self.once(E::NAME, &handler)?;
        Ok(handler)
    }
}

fn typed_handler<E, F>(f: F) -> Handler
where
    E: Event,
    F: Fn(E, &Invocation<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Handler::new(move |invocation| {
        let payload = invocation.arg(0).cloned().unwrap_or_default();
        let event = serde_json::from_value::<E>(payload).map_err(HandlerError::Payload)?;
        f(event, invocation)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BusOptions;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct UserLogin {
        user_id: String,
        timestamp: u64,
    }

    impl Event for UserLogin {
        const NAME: &'static str = "user:login";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct UserLogout;

    impl Event for UserLogout {
        const NAME: &'static str = "user:logout";
    }

    #[test]
    fn test_typed_round_trip() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        bus.on_event(move |login: UserLogin, _| {
            seen_clone.lock().unwrap().push(login);
            Ok(())
        })
        .unwrap();

        let login = UserLogin {
            user_id: "user123".into(),
            timestamp: 1_700_000_000,
        };
        assert!(bus.emit_event(&login).unwrap());
        assert_eq!(*seen.lock().unwrap(), vec![login]);
    }

    #[test]
    fn test_untyped_handler_sees_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        bus.on(
            UserLogin::NAME,
            Handler::infallible(move |inv| {
                *seen_clone.lock().unwrap() = inv.arg(0).cloned();
            }),
        )
        .unwrap();

        bus.emit_event(&UserLogin {
            user_id: "u".into(),
            timestamp: 1,
        })
        .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            Some(json!({"user_id": "u", "timestamp": 1}))
        );
    }

    #[test]
    fn test_bad_payload_reported() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = Arc::clone(&errors);
        let bus = EventBus::with_options(BusOptions::new().with_error_handler(
            move |err, _, _| {
                errors_clone
                    .lock()
                    .unwrap()
                    .push(matches!(err, HandlerError::Payload(_)));
            },
        ));

        bus.on_event(|_: UserLogin, _| Ok(())).unwrap();
        bus.emit(UserLogin::NAME, &[json!("garbage")]).unwrap();

        assert_eq!(*errors.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_once_event_and_off() {
        let bus = EventBus::new();

        bus.once_event(|_: UserLogout, _| Ok(())).unwrap();
        assert!(bus.emit_event(&UserLogout).unwrap());
        assert!(!bus.emit_event(&UserLogout).unwrap());

        let handler = bus.on_event(|_: UserLogout, _| Ok(())).unwrap();
        assert!(bus.has(UserLogout::NAME).unwrap());
        bus.off(UserLogout::NAME, Some(&handler)).unwrap();
        assert!(!bus.has(UserLogout::NAME).unwrap());
    }
}
