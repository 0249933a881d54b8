//! Inbound event dispatch.
//!
//! The handlers registered on a connection hold only a weak reference to
//! the session. Events that arrive after the session is gone are dropped.
//! Nothing raised here reaches the transport: read errors, undecodable
//! payloads and panicking callbacks are logged and swallowed.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, trace, warn};

use crate::message::CloseStatus;
use crate::transport::{Connection, TransportResult};

use super::session::Session;

/// Install the receive and close handlers for `session` on `connection`.
pub(super) fn register(session: &Session, connection: &dyn Connection) {
    let weak = session.downgrade();
    let id = session.id();
    connection.set_receive_handler(Arc::new(move |event| match weak.upgrade() {
        Some(session) => on_receive(&session, event),
        None => trace!(session = id, "message for destroyed session dropped"),
    }));

    let weak = session.downgrade();
    connection.set_close_handler(Arc::new(move |code| match weak.upgrade() {
        Some(session) => on_close(&session, code),
        None => trace!(session = id, code, "close for destroyed session dropped"),
    }));
}

fn on_receive(session: &Session, event: TransportResult<Bytes>) {
    let data = match event {
        Ok(data) => data,
        Err(err) => {
            warn!(session = session.id(), code = err.code, "receive failed: {}", err.message);
            return;
        }
    };
    if data.is_empty() {
        trace!(session = session.id(), "empty message ignored");
        return;
    }
    let text = match std::str::from_utf8(&data) {
        Ok(text) => text,
        Err(err) => {
            warn!(session = session.id(), bytes = data.len(), "dropping non UTF-8 message: {err}");
            return;
        }
    };
    debug!(session = session.id(), bytes = data.len(), "received message");

    let Some(callback) = session.client().message_function() else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(session, text))).is_err() {
        error!(session = session.id(), "message callback panicked");
    }
}

fn on_close(session: &Session, code: u16) {
    let status = CloseStatus::from_u16(code);
    session.mark_closed();
    info!(session = session.id(), code, "connection closed");

    let Some(callback) = session.client().close_function() else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(session, status))).is_err() {
        error!(session = session.id(), code, "close callback panicked");
    }
}
