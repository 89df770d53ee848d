//! Evenex - in-process publish/subscribe event bus.
//!
//! This crate provides:
//! - An [`EventBus`] mapping event keys to ordered handler lists
//! - Synchronous, snapshot-based dispatch with per-handler failure isolation
//! - One-shot subscriptions and bookkeeping queries
//! - Typed events ([`Event`]) on top of the dynamic JSON arguments
//! - TOML configuration ([`BusConfig`])
//!
//! # Architecture
//!
//! Keys are either string names or identity-compared [`Symbol`]s. Handlers
//! are reference-counted closures compared by identity, so the handle kept
//! at registration is the one that unsubscribes.
//!
//! `emit` copies the key's handler list, releases the registry, and calls
//! each handler in order. Handlers receive the bus through their
//! [`Invocation`] and may subscribe, unsubscribe, or emit while running;
//! those changes apply from the next dispatch on. Failures, returned or
//! panicked, go to the configured error callback and never reach the caller
//! of `emit`.
//!
//! # Example
//!
//! ```rust
//! use evenex::{EventBus, Handler};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//!
//! let greet = Handler::infallible(|inv| {
//!     println!("hello, {}", inv.arg(0).and_then(|v| v.as_str()).unwrap_or("?"));
//! });
//!
//! bus.on("greet", &greet).unwrap();
//! assert!(bus.emit("greet", &[json!("world")]).unwrap());
//!
//! bus.off("greet", Some(&greet)).unwrap();
//! assert!(!bus.emit("greet", &[]).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod config;
mod error;
mod handler;
mod key;
mod options;
mod registry;
mod typed;
mod validate;

pub use bus::{EventBus, create_bus};
pub use config::{BusConfig, MAX_LISTENERS_UPPER_BOUND};
pub use error::{
    ConfigError, ConfigResult, HandlerError, HandlerResult, TypedEventError, ValidationError,
};
pub use handler::{Context, Handler, Invocation, IntoHandler};
pub use key::{EventKey, IntoEventKey, Symbol};
pub use options::{BusOptions, ErrorCallback, default_error_callback};
pub use typed::Event;
pub use validate::{validate_event_key, validate_handler, validate_handler_value};
