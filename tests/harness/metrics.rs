//! Send outcome counters for concurrency tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use rsws_session::CompletionResult;

/// Atomic counters of completed sends.
#[derive(Debug, Default)]
pub struct Metrics {
    sent: AtomicUsize,
    failed: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished send.
    pub fn record(&self, result: &CompletionResult) {
        if result.is_ok() {
            self.sent.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.sent() + self.failed()
    }
}
