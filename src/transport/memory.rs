//! In-process transport.
//!
//! `MemoryTransport` implements the transport traits without any I/O. It
//! records every request, write and close so callers can inspect them, and
//! can either complete work inline (the default) or hold completions until
//! the owner releases them, standing in for a native completion thread.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use super::{
    CloseHandler, ConnectCallback, ConnectRequest, Connection, ReceiveHandler, Transport,
    TransportError, TransportResult, WriteCallback, WriteChannel,
};
use crate::message::MessageKind;

/// Code reported for writes attempted after a close request.
pub const CLOSED_CODE: i32 = -10;

/// Code reported when the write channel is requested before connecting.
pub const NOT_CONNECTED_CODE: i32 = -11;

/// How a memory connection completes its work.
#[derive(Debug, Clone)]
pub struct MemoryBehavior {
    /// Fail `open_connection` synchronously.
    pub open_error: Option<TransportError>,
    /// Fail `connect` synchronously.
    pub connect_error: Option<TransportError>,
    /// Outcome delivered to the connect callback.
    pub connect_result: TransportResult<()>,
    /// Hold the connect callback until [`MemoryConnection::complete_connect`].
    pub manual_connect: bool,
    /// Fail `write_channel` even after a successful connect.
    pub channel_error: Option<TransportError>,
    /// Fail `write_and_flush` synchronously.
    pub write_error: Option<TransportError>,
    /// Outcome delivered to each write callback in automatic mode.
    pub write_result: TransportResult<()>,
    /// Hold write callbacks until [`MemoryConnection::complete_next_write`].
    pub manual_writes: bool,
    /// Deliver each successful write back as an inbound message, and each
    /// close request back as a close event.
    pub echo: bool,
    /// Reject the first close request with this error.
    pub close_error: Option<TransportError>,
}

impl Default for MemoryBehavior {
    fn default() -> Self {
        Self {
            open_error: None,
            connect_error: None,
            connect_result: Ok(()),
            manual_connect: false,
            channel_error: None,
            write_error: None,
            write_result: Ok(()),
            manual_writes: false,
            echo: false,
            close_error: None,
        }
    }
}

/// Transport whose connections live in memory.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    behavior: Arc<Mutex<MemoryBehavior>>,
    connections: Arc<Mutex<Vec<MemoryConnection>>>,
}

impl MemoryTransport {
    /// Transport that completes every operation inline and successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport using `behavior` for connections opened from now on.
    #[must_use]
    pub fn with_behavior(behavior: MemoryBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            connections: Arc::default(),
        }
    }

    /// Echo writes and close requests back to the session.
    #[must_use]
    pub fn echo() -> Self {
        Self::with_behavior(MemoryBehavior {
            echo: true,
            ..MemoryBehavior::default()
        })
    }

    /// Replace the behavior used for connections opened from now on.
    pub fn set_behavior(&self, behavior: MemoryBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// All connections opened so far.
    #[must_use]
    pub fn connections(&self) -> Vec<MemoryConnection> {
        self.connections.lock().clone()
    }

    /// Most recently opened connection.
    #[must_use]
    pub fn last_connection(&self) -> Option<MemoryConnection> {
        self.connections.lock().last().cloned()
    }

    /// Number of `open_connection` calls that succeeded.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.connections.lock().len()
    }
}

impl Transport for MemoryTransport {
    fn open_connection(&self, request: ConnectRequest) -> TransportResult<Arc<dyn Connection>> {
        let behavior = self.behavior.lock().clone();
        if let Some(err) = behavior.open_error.clone() {
            return Err(err);
        }
        let conn = MemoryConnection::new(request, behavior);
        self.connections.lock().push(conn.clone());
        Ok(Arc::new(conn))
    }
}

struct ConnShared {
    request: ConnectRequest,
    behavior: MemoryBehavior,
    receive: Mutex<Option<ReceiveHandler>>,
    close: Mutex<Option<CloseHandler>>,
    handlers_ready_at_connect: AtomicBool,
    connected: AtomicBool,
    closed: AtomicBool,
    close_rejected: AtomicBool,
    pending_connect: Mutex<Option<ConnectCallback>>,
    writes: Mutex<Vec<(MessageKind, Bytes)>>,
    pending_writes: Mutex<VecDeque<(Bytes, WriteCallback)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    close_requests: Mutex<Vec<(u16, String)>>,
}

/// Connection created by [`MemoryTransport`]. Clones share state.
#[derive(Clone)]
pub struct MemoryConnection {
    shared: Arc<ConnShared>,
}

impl MemoryConnection {
    fn new(request: ConnectRequest, behavior: MemoryBehavior) -> Self {
        Self {
            shared: Arc::new(ConnShared {
                request,
                behavior,
                receive: Mutex::new(None),
                close: Mutex::new(None),
                handlers_ready_at_connect: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                close_rejected: AtomicBool::new(false),
                pending_connect: Mutex::new(None),
                writes: Mutex::new(Vec::new()),
                pending_writes: Mutex::new(VecDeque::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                close_requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Request this connection was opened with.
    #[must_use]
    pub fn request(&self) -> &ConnectRequest {
        &self.shared.request
    }

    /// Whether both event handlers were registered when `connect` ran.
    #[must_use]
    pub fn handlers_ready_at_connect(&self) -> bool {
        self.shared.handlers_ready_at_connect.load(Ordering::Acquire)
    }

    /// Whether the last connect attempt succeeded.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Finish a held connect attempt. Returns `false` if none is pending.
    pub fn complete_connect(&self, result: TransportResult<()>) -> bool {
        let Some(callback) = self.shared.pending_connect.lock().take() else {
            return false;
        };
        self.shared.connected.store(result.is_ok(), Ordering::Release);
        callback(result);
        true
    }

    /// Every write started so far, in the order the transport received them.
    #[must_use]
    pub fn writes(&self) -> Vec<(MessageKind, Bytes)> {
        self.shared.writes.lock().clone()
    }

    /// Written payloads decoded as UTF-8 (lossy).
    #[must_use]
    pub fn written_text(&self) -> Vec<String> {
        self.shared
            .writes
            .lock()
            .iter()
            .map(|(_, data)| String::from_utf8_lossy(data).into_owned())
            .collect()
    }

    /// Number of writes waiting for [`complete_next_write`](Self::complete_next_write).
    #[must_use]
    pub fn pending_write_count(&self) -> usize {
        self.shared.pending_writes.lock().len()
    }

    /// Highest number of simultaneously outstanding writes observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.shared.max_in_flight.load(Ordering::Acquire)
    }

    /// Finish the oldest held write. Returns `false` if none is pending.
    pub fn complete_next_write(&self, result: TransportResult<()>) -> bool {
        let Some((data, callback)) = self.shared.pending_writes.lock().pop_front() else {
            return false;
        };
        self.finish_write(data, callback, result);
        true
    }

    /// Close requests received, as `(code, reason)`.
    #[must_use]
    pub fn close_requests(&self) -> Vec<(u16, String)> {
        self.shared.close_requests.lock().clone()
    }

    /// Deliver an inbound message event. Returns `false` if no handler is set.
    pub fn deliver_message(&self, event: TransportResult<Bytes>) -> bool {
        let handler = self.shared.receive.lock().clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => false,
        }
    }

    /// Deliver a close event. Returns `false` if no handler is set.
    pub fn deliver_close(&self, code: u16) -> bool {
        let handler = self.shared.close.lock().clone();
        match handler {
            Some(handler) => {
                handler(code);
                true
            }
            None => false,
        }
    }

    fn finish_write(&self, data: Bytes, callback: WriteCallback, result: TransportResult<()>) {
        self.shared.in_flight.fetch_sub(1, Ordering::AcqRel);
        let echo = self.shared.behavior.echo && result.is_ok();
        callback(result);
        if echo {
            self.deliver_message(Ok(data));
        }
    }
}

impl Connection for MemoryConnection {
    fn set_receive_handler(&self, handler: ReceiveHandler) {
        *self.shared.receive.lock() = Some(handler);
    }

    fn set_close_handler(&self, handler: CloseHandler) {
        *self.shared.close.lock() = Some(handler);
    }

    fn connect(&self, on_complete: ConnectCallback) -> TransportResult<()> {
        let ready = self.shared.receive.lock().is_some() && self.shared.close.lock().is_some();
        self.shared
            .handlers_ready_at_connect
            .store(ready, Ordering::Release);

        let behavior = &self.shared.behavior;
        if let Some(err) = behavior.connect_error.clone() {
            return Err(err);
        }
        if behavior.manual_connect {
            *self.shared.pending_connect.lock() = Some(on_complete);
            return Ok(());
        }

        let result = behavior.connect_result.clone();
        self.shared.connected.store(result.is_ok(), Ordering::Release);
        on_complete(result);
        Ok(())
    }

    fn write_channel(&self) -> TransportResult<Arc<dyn WriteChannel>> {
        if let Some(err) = self.shared.behavior.channel_error.clone() {
            return Err(err);
        }
        if !self.is_connected() {
            return Err(TransportError::new(NOT_CONNECTED_CODE, "not connected"));
        }
        Ok(Arc::new(MemoryWriter { conn: self.clone() }))
    }

    fn close(&self, code: u16, reason: &str) -> TransportResult<()> {
        if let Some(err) = self.shared.behavior.close_error.clone() {
            if !self.shared.close_rejected.swap(true, Ordering::AcqRel) {
                return Err(err);
            }
        }
        self.shared
            .close_requests
            .lock()
            .push((code, reason.to_string()));
        self.shared.closed.store(true, Ordering::Release);
        if self.shared.behavior.echo {
            self.deliver_close(code);
        }
        Ok(())
    }
}

struct MemoryWriter {
    conn: MemoryConnection,
}

impl WriteChannel for MemoryWriter {
    fn write_and_flush(
        &self,
        kind: MessageKind,
        data: Bytes,
        on_complete: WriteCallback,
    ) -> TransportResult<()> {
        let shared = &self.conn.shared;
        if let Some(err) = shared.behavior.write_error.clone() {
            return Err(err);
        }

        shared.writes.lock().push((kind, data.clone()));
        let now = shared.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        shared.max_in_flight.fetch_max(now, Ordering::AcqRel);

        if shared.closed.load(Ordering::Acquire) {
            self.conn.finish_write(
                data,
                on_complete,
                Err(TransportError::new(CLOSED_CODE, "connection closed")),
            );
            return Ok(());
        }

        if shared.behavior.manual_writes {
            shared.pending_writes.lock().push_back((data, on_complete));
        } else {
            let result = shared.behavior.write_result.clone();
            self.conn.finish_write(data, on_complete, result);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU16;

    fn request(uri: &str) -> ConnectRequest {
        ConnectRequest {
            uri: uri.to_string(),
            ..ConnectRequest::default()
        }
    }

    #[test]
    fn test_open_records_request() {
        let transport = MemoryTransport::new();
        transport.open_connection(request("ws://a")).unwrap();
        transport.open_connection(request("ws://b")).unwrap();

        assert_eq!(transport.open_count(), 2);
        assert_eq!(transport.last_connection().unwrap().request().uri, "ws://b");
    }

    #[test]
    fn test_open_error() {
        let transport = MemoryTransport::with_behavior(MemoryBehavior {
            open_error: Some(TransportError::new(7, "no route")),
            ..MemoryBehavior::default()
        });
        assert!(transport.open_connection(request("ws://a")).is_err());
        assert_eq!(transport.open_count(), 0);
    }

    #[test]
    fn test_connect_inline() {
        let transport = MemoryTransport::new();
        let conn = transport.open_connection(request("ws://a")).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        conn.connect(Box::new(move |r| flag.store(r.is_ok(), Ordering::SeqCst)))
            .unwrap();

        assert!(done.load(Ordering::SeqCst));
        assert!(conn.write_channel().is_ok());
        assert!(!transport.last_connection().unwrap().handlers_ready_at_connect());
    }

    #[test]
    fn test_write_channel_requires_connect() {
        let transport = MemoryTransport::new();
        let conn = transport.open_connection(request("ws://a")).unwrap();
        let err = conn.write_channel().err().unwrap();
        assert_eq!(err.code, NOT_CONNECTED_CODE);
    }

    #[test]
    fn test_manual_writes_hold_completion() {
        let transport = MemoryTransport::with_behavior(MemoryBehavior {
            manual_writes: true,
            ..MemoryBehavior::default()
        });
        let conn = transport.open_connection(request("ws://a")).unwrap();
        conn.connect(Box::new(|_| {})).unwrap();
        let writer = conn.write_channel().unwrap();

        let completed = Arc::new(AtomicUsize::new(0));
        for text in ["one", "two"] {
            let completed = completed.clone();
            writer
                .write_and_flush(
                    MessageKind::Text,
                    Bytes::from(text),
                    Box::new(move |_| {
                        completed.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
        }

        let mem = transport.last_connection().unwrap();
        assert_eq!(mem.pending_write_count(), 2);
        assert_eq!(mem.max_in_flight(), 2);
        assert!(mem.complete_next_write(Ok(())));
        assert!(mem.complete_next_write(Ok(())));
        assert!(!mem.complete_next_write(Ok(())));
        assert_eq!(completed.load(Ordering::SeqCst), 2);
        assert_eq!(mem.written_text(), ["one", "two"]);
    }

    #[test]
    fn test_echo_close() {
        let transport = MemoryTransport::echo();
        let conn = transport.open_connection(request("ws://a")).unwrap();
        let code = Arc::new(AtomicU16::new(0));
        let seen = code.clone();
        conn.set_close_handler(Arc::new(move |c| seen.store(c, Ordering::SeqCst)));
        conn.close(1001, "").unwrap();

        assert_eq!(code.load(Ordering::SeqCst), 1001);
        assert_eq!(
            transport.last_connection().unwrap().close_requests(),
            [(1001, String::new())]
        );
    }

    #[test]
    fn test_write_after_close_fails() {
        let transport = MemoryTransport::new();
        let conn = transport.open_connection(request("ws://a")).unwrap();
        conn.connect(Box::new(|_| {})).unwrap();
        let writer = conn.write_channel().unwrap();
        conn.close(1000, "").unwrap();

        let code = Arc::new(Mutex::new(None));
        let seen = code.clone();
        writer
            .write_and_flush(
                MessageKind::Text,
                Bytes::from_static(b"late"),
                Box::new(move |r| *seen.lock() = r.err().map(|e| e.code)),
            )
            .unwrap();
        assert_eq!(*code.lock(), Some(CLOSED_CODE));
    }
}
