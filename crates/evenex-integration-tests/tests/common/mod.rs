//! Shared helpers for integration tests.

use evenex::{BusOptions, EventBus};
use evenex_test::{CallRecorder, ErrorCollector};

/// A bus wired to a recorder and an error collector.
#[allow(dead_code)]
pub struct BusHarness {
    /// The bus under test.
    pub bus: EventBus,
    /// Records handler calls.
    pub recorder: CallRecorder,
    /// Collects failures routed to the error callback.
    pub errors: ErrorCollector,
}

#[allow(dead_code)]
impl BusHarness {
    /// Harness over a bus with default options.
    pub fn new() -> Self {
        Self::with_options(BusOptions::new())
    }

    /// Harness over a bus with `options`; the error callback is replaced by
    /// the collector.
    pub fn with_options(options: BusOptions) -> Self {
        let errors = ErrorCollector::new();
        let bus = EventBus::with_options(errors.install(options));
        Self {
            bus,
            recorder: CallRecorder::new(),
            errors,
        }
    }
}
