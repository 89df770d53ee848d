//! Recording handlers and error collection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use evenex::{BusOptions, EventKey, Handler, HandlerError};
use serde_json::Value;

/// One recorded handler call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Label given to the handler that ran.
    pub label: String,
    /// Key that was emitted.
    pub key: EventKey,
    /// Arguments passed to `emit`.
    pub args: Vec<Value>,
}

/// Factory for handlers that record every call into a shared log.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallRecorder {
    /// Create a recorder with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that records its call and succeeds.
    #[must_use]
    pub fn handler(&self, label: impl Into<String>) -> Handler {
        let calls = Arc::clone(&self.calls);
        let label = label.into();
        Handler::infallible(move |inv| {
            record(&calls, &label, inv.key(), inv.args());
        })
    }

    /// A handler that records its call, then returns an error.
    #[must_use]
    pub fn failing_handler(&self, label: impl Into<String>, message: impl Into<String>) -> Handler {
        let calls = Arc::clone(&self.calls);
        let label = label.into();
        let message = message.into();
        Handler::new(move |inv| {
            record(&calls, &label, inv.key(), inv.args());
            Err(HandlerError::msg(message.clone()))
        })
    }

    /// A handler that records its call, then panics.
    #[must_use]
    pub fn panicking_handler(
        &self,
        label: impl Into<String>,
        message: impl Into<String>,
    ) -> Handler {
        let calls = Arc::clone(&self.calls);
        let label = label.into();
        let message = message.into();
        Handler::infallible(move |inv| {
            record(&calls, &label, inv.key(), inv.args());
            panic!("{message}");
        })
    }

    /// All recorded calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Labels of recorded calls, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|call| call.label.clone())
            .collect()
    }

    /// Total number of recorded calls.
    #[must_use]
    pub fn count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of recorded calls for one label.
    #[must_use]
    pub fn count_for(&self, label: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.label == label)
            .count()
    }

    /// Forget all recorded calls.
    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

fn record(calls: &Mutex<Vec<RecordedCall>>, label: &str, key: &EventKey, args: &[Value]) {
    lock(calls).push(RecordedCall {
        label: label.to_owned(),
        key: key.clone(),
        args: args.to_vec(),
    });
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One failure delivered to the bus error callback.
#[derive(Debug, Clone)]
pub struct CollectedError {
    /// Rendered error message.
    pub message: String,
    /// Whether the handler panicked rather than returning an error.
    pub panicked: bool,
    /// Key being emitted.
    pub key: EventKey,
    /// Handler that failed.
    pub handler: Handler,
}

/// Collects failures routed to the bus error callback.
///
/// Clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<CollectedError>>>,
}

impl ErrorCollector {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default bus options with this collector as the error callback.
    #[must_use]
    pub fn options(&self) -> BusOptions {
        self.install(BusOptions::new())
    }

    /// Install this collector as the error callback of `options`.
    #[must_use]
    pub fn install(&self, options: BusOptions) -> BusOptions {
        let errors = Arc::clone(&self.errors);
        options.with_error_handler(move |err, key, handler| {
            lock(&errors).push(CollectedError {
                message: err.to_string(),
                panicked: matches!(err, HandlerError::Panicked(_)),
                key: key.clone(),
                handler: handler.clone(),
            });
        })
    }

    /// All collected failures, oldest first.
    #[must_use]
    pub fn errors(&self) -> Vec<CollectedError> {
        lock(&self.errors).clone()
    }

    /// Rendered messages of collected failures, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        lock(&self.errors)
            .iter()
            .map(|err| err.message.clone())
            .collect()
    }

    /// Number of collected failures.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.errors).len()
    }

    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.errors).is_empty()
    }
}
