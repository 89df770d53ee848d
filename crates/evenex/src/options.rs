//! Bus-wide options.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::error;
use tracing::subscriber::NoSubscriber;

use crate::config::BusConfig;
use crate::error::HandlerError;
use crate::handler::Handler;
use crate::key::EventKey;

/// Callback receiving handler failures caught during dispatch.
pub type ErrorCallback = Arc<dyn Fn(&HandlerError, &EventKey, &Handler) + Send + Sync>;

/// Options consulted by registration and dispatch.
#[derive(Clone)]
pub struct BusOptions {
    /// Log every bus operation at debug level.
    pub debug: bool,
    /// Warn when a key's handler list grows beyond this many entries.
    /// Zero disables the check.
    pub max_listeners: usize,
    /// Receives every handler failure.
    pub on_error: ErrorCallback,
}

impl BusOptions {
    /// Options with debug logging off, no listener limit, and the default
    /// error callback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debug: false,
            max_listeners: 0,
            on_error: default_error_callback(),
        }
    }

    /// Enable or disable debug logging.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the listener warning threshold.
    #[must_use]
    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }

    /// Replace the error callback.
    #[must_use]
    pub fn with_error_handler<F>(mut self, callback: F) -> Self
    where
        F: Fn(&HandlerError, &EventKey, &Handler) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(callback);
        self
    }

    /// Returns `true` if a list of `count` handlers exceeds the threshold.
    #[must_use]
    pub fn exceeds_max_listeners(&self, count: usize) -> bool {
        self.max_listeners > 0 && count > self.max_listeners
    }
}

impl Default for BusOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BusOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusOptions")
            .field("debug", &self.debug)
            .field("max_listeners", &self.max_listeners)
            .finish_non_exhaustive()
    }
}

impl From<BusConfig> for BusOptions {
    fn from(config: BusConfig) -> Self {
        Self::new()
            .with_debug(config.debug)
            .with_max_listeners(config.max_listeners)
    }
}

impl From<&BusConfig> for BusOptions {
    fn from(config: &BusConfig) -> Self {
        Self::from(config.clone())
    }
}

/// The callback used when none is configured: log the failure at error level.
///
/// When no `tracing` subscriber is active on the current thread the failure
/// is also written to stderr, so it is never silently dropped.
#[must_use]
pub fn default_error_callback() -> ErrorCallback {
    Arc::new(|err: &HandlerError, key: &EventKey, _handler: &Handler| {
        error!(event = %key, error = %err, "Error in event handler");
        if !has_subscriber() {
            let _ = write_fallback(&mut io::stderr().lock(), err, key);
        }
    })
}

fn has_subscriber() -> bool {
    tracing::dispatcher::get_default(|dispatch| !dispatch.is::<NoSubscriber>())
}

fn write_fallback(out: &mut dyn Write, err: &HandlerError, key: &EventKey) -> io::Result<()> {
    writeln!(out, "Error in event \"{key}\": {err}")
}
