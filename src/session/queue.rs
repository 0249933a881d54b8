//! Outgoing message queue with a single-flight send pipeline.
//!
//! The lock guards only the deque and the pipeline tag. It is never held
//! across a transport call.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::config::Limits;
use crate::error::Result;

/// Send pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pipeline {
    /// Nothing queued and nothing in flight.
    Idle,
    /// A transmission is scheduled or in flight.
    Sending,
}

struct Inner<T> {
    waiting: VecDeque<T>,
    pipeline: Pipeline,
    in_flight: usize,
}

/// FIFO of messages waiting for the transport.
pub(crate) struct OutgoingQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> OutgoingQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                waiting: VecDeque::new(),
                pipeline: Pipeline::Idle,
                in_flight: 0,
            }),
        }
    }

    /// Append the message built by `make`. Returns `true` if the pipeline
    /// was idle before the push, in which case the caller must start a
    /// transmission. The idle check and the push happen under one lock, and
    /// `make` runs under it too so ids assigned there follow queue order.
    pub(crate) fn push(&self, limits: &Limits, make: impl FnOnce() -> T) -> Result<bool> {
        let mut inner = self.inner.lock();
        limits.check_queue_depth(inner.waiting.len())?;
        let start = inner.pipeline == Pipeline::Idle;
        inner.waiting.push_back(make());
        if start {
            inner.pipeline = Pipeline::Sending;
        }
        Ok(start)
    }

    /// Take the head for transmission.
    pub(crate) fn pop_head(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        debug_assert_eq!(inner.pipeline, Pipeline::Sending);
        debug_assert_eq!(inner.in_flight, 0, "second transmission started");
        let message = inner.waiting.pop_front()?;
        inner.in_flight += 1;
        Some(message)
    }

    /// Mark the in-flight transmission finished. Returns `true` if another
    /// message is waiting; otherwise the pipeline goes back to idle.
    pub(crate) fn finish_current(&self) -> bool {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.waiting.is_empty() {
            inner.pipeline = Pipeline::Idle;
            false
        } else {
            true
        }
    }

    /// Number of messages waiting, excluding the one in flight.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().waiting.len()
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }

    pub(crate) fn pipeline(&self) -> Pipeline {
        self.inner.lock().pipeline
    }
}
