//! Prelude module - commonly used types for convenient import.
//!
//! Use `use evenex::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use evenex::prelude::*;
//!
//! let bus = EventBus::with_options(BusOptions::new().with_max_listeners(10));
//! bus.once("ready", Handler::new(|_| Ok(()))).unwrap();
//!
//! assert_eq!(bus.listener_count("ready").unwrap(), 1);
//! assert!(bus.emit("ready", &[]).unwrap());
//! assert!(!bus.has("ready").unwrap());
//! ```

// Event bus
pub use crate::{BusConfig, BusOptions, EventBus, create_bus};

// Keys and handlers
pub use crate::{Context, EventKey, Handler, Invocation, Symbol};

// Typed events
pub use crate::Event;

// Errors
pub use crate::{HandlerError, HandlerResult, ValidationError};
