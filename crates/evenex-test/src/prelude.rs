//! Prelude module - commonly used test helpers.
//!
//! Use `use evenex_test::prelude::*;` in test modules.

pub use crate::{
    CallRecorder, CollectedError, ErrorCollector, RecordedCall, capture_logs, init_test_logging,
};
