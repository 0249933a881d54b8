//! Ordered, single-flight message delivery.
//!
//! Each queued message owns a pending operation. Starting a transmission
//! pops the head and schedules its operation on the executor; the
//! operation's cleanup either schedules the next head or returns the
//! pipeline to idle. Cleanup runs on every path, so a failed write never
//! stalls the queue.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use crate::async_op::{self, AsyncOp, AsyncProvider, Completer, OpSlot};
use crate::error::{Error, Result};
use crate::message::Payload;

use super::result::CompletionResult;
use super::session::Session;

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// A message waiting in the outgoing queue.
pub(super) struct OutgoingMessage {
    id: u64,
    payload: Payload,
    slot: OpSlot<CompletionResult>,
    session: Session,
}

impl Session {
    pub(super) fn enqueue(&self, payload: Payload) -> Result<AsyncOp<CompletionResult>> {
        if payload.is_empty() {
            return Err(Error::InvalidArgument("message is empty".into()));
        }
        let limits = &self.client().config().limits;
        limits.check_message_size(payload.len())?;
        if self.writer().is_none() {
            return Err(Error::Unexpected("session is not connected".into()));
        }

        let (op, slot) = async_op::pending();
        let mut id = 0;
        let start = self.inner.queue.push(limits, || {
            id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
            OutgoingMessage {
                id,
                payload,
                slot,
                session: self.acquire(),
            }
        })?;
        trace!(
            session = self.id(),
            message = id,
            queued = self.inner.queue.len(),
            "message queued"
        );

        if start {
            self.start_next_send();
        }
        Ok(op)
    }

    /// Pop the head of the queue and schedule its transmission.
    pub(super) fn start_next_send(&self) {
        let Some(message) = self.inner.queue.pop_head() else {
            return;
        };
        let OutgoingMessage {
            id,
            payload,
            slot,
            session,
        } = message;
        let provider = SendProvider {
            id,
            payload,
            session,
        };
        if let Err(err) = async_op::start(slot, provider, self.client().executor()) {
            warn!(session = self.id(), message = id, "failed to schedule send: {err}");
        }
    }
}

struct SendProvider {
    id: u64,
    payload: Payload,
    session: Session,
}

impl AsyncProvider for SendProvider {
    type Output = CompletionResult;

    fn do_work(&mut self, completer: Completer) -> Result<()> {
        let writer = self
            .session
            .writer()
            .ok_or_else(|| Error::Unexpected("write channel released".into()))?;
        let (session, message) = (self.session.id(), self.id);
        trace!(session, message, bytes = self.payload.len(), "writing message");

        writer.write_and_flush(
            self.payload.kind(),
            self.payload.bytes(),
            Box::new(move |status| {
                match &status {
                    Ok(()) => debug!(session, message, "send complete"),
                    Err(err) => warn!(session, message, code = err.code, "send failed: {}", err.message),
                }
                completer.complete(status.map_err(Error::from));
            }),
        )?;
        Ok(())
    }

    fn get_result(&mut self, status: &Result<()>) -> CompletionResult {
        if let Err(err) = status {
            debug!(session = self.session.id(), message = self.id, "send finished with error: {err}");
        }
        CompletionResult::from_status(self.session.clone(), status)
    }

    fn cleanup(self) {
        if self.session.inner.queue.finish_current() {
            self.session.start_next_send();
        }
    }
}
