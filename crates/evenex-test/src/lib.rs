//! Evenex Test - Shared test utilities for the evenex event bus.
//!
//! This crate provides recording handlers, an error collector for the bus
//! error callback, and helpers to capture or print `tracing` output in
//! tests.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! evenex-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust
//! use evenex::EventBus;
//! use evenex_test::{CallRecorder, ErrorCollector};
//!
//! let errors = ErrorCollector::new();
//! let bus = EventBus::with_options(errors.options());
//! let recorder = CallRecorder::new();
//!
//! bus.on("test", recorder.failing_handler("h1", "boom")).unwrap();
//! bus.on("test", recorder.handler("h2")).unwrap();
//! bus.emit("test", &[]).unwrap();
//!
//! assert_eq!(recorder.labels(), vec!["h1", "h2"]);
//! assert_eq!(errors.messages(), vec!["handler failed: boom"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod logging;
pub mod recorder;

pub use logging::*;
pub use recorder::*;
