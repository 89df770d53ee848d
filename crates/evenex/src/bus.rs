//! The event bus: registration, synchronous dispatch, and bookkeeping.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::config::BusConfig;
use crate::error::{HandlerError, ValidationError};
use crate::handler::{Context, Handler, IntoHandler, Invocation};
use crate::key::{EventKey, IntoEventKey};
use crate::options::BusOptions;
use crate::registry::{Registration, Registry, Snapshot};

struct Inner {
    registry: RwLock<Registry>,
    options: BusOptions,
}

/// In-process publish/subscribe event bus.
///
/// Handlers are invoked synchronously, in registration order, on the thread
/// calling [`emit`](Self::emit). The registry lock is never held while a
/// handler runs, so handlers may call back into the bus.
///
/// Cloning a bus produces another handle on the same registry and options.
/// Use [`EventBus::new`] or [`create_bus`] for an independent bus.
///
/// **WARNING:** A handler that captures a clone of the bus it is registered
/// on forms an `Arc` cycle and keeps the bus alive. Use the bus passed in
/// [`Invocation::bus`] instead.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    /// Create a bus with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(BusOptions::default())
    }

    /// Create a bus with the given options.
    #[must_use]
    pub fn with_options(options: BusOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry::new()),
                options,
            }),
        }
    }

    /// Create a bus from loaded configuration, with the default error
    /// callback.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        Self::with_options(BusOptions::from(config))
    }

    /// The options this bus was created with.
    #[must_use]
    pub fn options(&self) -> &BusOptions {
        &self.inner.options
    }

    /// Subscribe a handler to `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key or handler is invalid.
    pub fn on(
        &self,
        key: impl IntoEventKey,
        handler: impl IntoHandler,
    ) -> Result<&Self, ValidationError> {
        self.register(key, handler, None, false)
    }

    /// Subscribe a handler to `key` with a bound context value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key or handler is invalid.
    pub fn on_with_context(
        &self,
        key: impl IntoEventKey,
        handler: impl IntoHandler,
        context: Context,
    ) -> Result<&Self, ValidationError> {
        self.register(key, handler, Some(context), false)
    }

    /// Subscribe a handler that runs on the next emit of `key` only.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key or handler is invalid.
    pub fn once(
        &self,
        key: impl IntoEventKey,
        handler: impl IntoHandler,
    ) -> Result<&Self, ValidationError> {
        self.register(key, handler, None, true)
    }

    /// Subscribe a one-shot handler with a bound context value.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key or handler is invalid.
    pub fn once_with_context(
        &self,
        key: impl IntoEventKey,
        handler: impl IntoHandler,
        context: Context,
    ) -> Result<&Self, ValidationError> {
        self.register(key, handler, Some(context), true)
    }

    fn register(
        &self,
        key: impl IntoEventKey,
        handler: impl IntoHandler,
        context: Option<Context>,
        once: bool,
    ) -> Result<&Self, ValidationError> {
        let key = key.into_event_key()?;
        let handler = handler.into_handler()?;
        let action = if once { "once" } else { "on" };

        let count = self
            .write()
            .push(key.clone(), Registration::new(handler, context, once));

        let options = &self.inner.options;
        if options.exceeds_max_listeners(count) {
            warn!(
                event = %key,
                max_listeners = options.max_listeners,
                count,
                "Max listeners ({}) exceeded for event \"{}\"",
                options.max_listeners,
                key
            );
        }

        self.log(action, &key, format_args!("{count} listener(s)"));
        Ok(self)
    }

    /// Unsubscribe from `key`.
    ///
    /// With a handler, removes every registration of that exact handler.
    /// Without one, removes all handlers for the key. Unknown keys and
    /// handlers are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn off(
        &self,
        key: impl IntoEventKey,
        handler: Option<&Handler>,
    ) -> Result<&Self, ValidationError> {
        let key = key.into_event_key()?;

        let removed = {
            let mut registry = self.write();
            match handler {
                Some(handler) => registry.remove_handler(&key, handler),
                None => registry.remove_key(&key),
            }
        };

        if handler.is_some() {
            self.log("off", &key, format_args!("{removed} registration(s)"));
        } else {
            self.log("off", &key, format_args!("all handlers"));
        }
        Ok(self)
    }

    /// Invoke every handler registered for `key` with `args`.
    ///
    /// Handlers run in registration order against a snapshot of the list
    /// taken on entry. A failing or panicking handler is reported to the
    /// error callback and the remaining handlers still run. One-shot
    /// handlers in the snapshot are removed afterwards.
    ///
    /// Returns `true` if the key had at least one handler.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn emit(&self, key: impl IntoEventKey, args: &[Value]) -> Result<bool, ValidationError> {
        let key = key.into_event_key()?;

        let Some(snapshot) = self.read().snapshot(&key) else {
            self.log("emit", &key, format_args!("no listeners"));
            return Ok(false);
        };

        self.log("emit", &key, format_args!("{} arg(s)", args.len()));
        trace!(event = %key, handlers = snapshot.len(), "Dispatching snapshot");

        self.dispatch(&key, &snapshot, args);
        self.remove_fired_once(&key, &snapshot);

        Ok(true)
    }

    fn dispatch(&self, key: &EventKey, snapshot: &Snapshot, args: &[Value]) {
        for entry in snapshot {
            if !entry.claim() {
                trace!(event = %key, "Skipping one-shot handler already fired");
                continue;
            }

            let invocation = Invocation::new(self, key, args, entry.context.as_ref());

            // Catch panics to prevent one handler from affecting others
            let result = catch_unwind(AssertUnwindSafe(|| entry.handler.call(&invocation)))
                .unwrap_or_else(|panic| Err(HandlerError::Panicked(panic_message(&*panic))));

            if let Err(err) = result {
                self.report(&err, key, &entry.handler);
            }
        }
    }

    fn report(&self, err: &HandlerError, key: &EventKey, handler: &Handler) {
        let on_error = &self.inner.options.on_error;
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| on_error(err, key, handler))) {
            error!(
                event = %key,
                error = %err,
                panic = %panic_message(&*panic),
                "Error callback panicked"
            );
        }
    }

    fn remove_fired_once(&self, key: &EventKey, snapshot: &Snapshot) {
        let once: Snapshot = snapshot.iter().filter(|e| e.once).cloned().collect();
        if once.is_empty() {
            return;
        }

        let removed = self.write().remove_entries(key, &once);
        trace!(event = %key, removed, "Removed one-shot handlers");
    }

    /// Returns `true` if `key` has at least one handler.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn has(&self, key: impl IntoEventKey) -> Result<bool, ValidationError> {
        let key = key.into_event_key()?;
        Ok(self.read().contains(&key))
    }

    /// Number of handlers registered for `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn listener_count(&self, key: impl IntoEventKey) -> Result<usize, ValidationError> {
        let key = key.into_event_key()?;
        Ok(self.read().len(&key))
    }

    /// Every key that currently has handlers, in first-registration order.
    #[must_use]
    pub fn event_names(&self) -> Vec<EventKey> {
        self.read().keys()
    }

    /// Handlers registered for `key`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn listeners(&self, key: impl IntoEventKey) -> Result<Vec<Handler>, ValidationError> {
        let key = key.into_event_key()?;
        Ok(self.read().handlers(&key))
    }

    /// Remove the handlers for `key`, or every handler when `key` is `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the key is invalid.
    pub fn clear<K: IntoEventKey>(&self, key: Option<K>) -> Result<&Self, ValidationError> {
        match key {
            Some(key) => {
                let key = key.into_event_key()?;
                self.write().remove_key(&key);
                self.log("clear", &key, format_args!("event"));
            },
            None => self.clear_all(),
        }
        Ok(self)
    }

    /// Remove every handler for every key.
    pub fn remove_all_listeners(&self) -> &Self {
        self.clear_all();
        self
    }

    fn clear_all(&self) {
        self.write().clear();
        if self.inner.options.debug {
            debug!(action = "clear", "[Evenex] clear: all events");
        }
    }

    fn log(&self, action: &str, key: &EventKey, detail: fmt::Arguments<'_>) {
        if self.inner.options.debug {
            debug!(action, event = %key, "[Evenex] {action}: {key} {detail}");
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        // Handlers never run under the lock, so a poisoned registry is intact.
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("event_count", &self.read().key_count())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Create an independent bus with the given options.
#[must_use]
pub fn create_bus(options: BusOptions) -> EventBus {
    EventBus::with_options(options)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
