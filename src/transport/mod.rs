//! Transport collaborator interface.
//!
//! The transport owns sockets, the opening handshake and framing. Sessions
//! only drive it through the traits here. Every fallible call returns a
//! [`TransportError`] rather than panicking; the session maps it into
//! [`Error`](crate::Error) in one place.
//!
//! Completion callbacks and event handlers may be invoked on any thread,
//! including synchronously from inside the call that started the work.

pub mod memory;

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::headers::HeaderList;
use crate::message::MessageKind;

pub use memory::{MemoryConnection, MemoryTransport};

/// Failure reported by a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct TransportError {
    /// Native error code.
    pub code: i32,
    /// Description.
    pub message: String,
}

impl TransportError {
    /// Create a transport error.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Result of a transport call.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Everything the transport needs to open a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Target URI.
    pub uri: String,
    /// Request headers, excluding the subprotocol header.
    pub headers: HeaderList,
    /// Supported subprotocols in preference order.
    pub subprotocols: Vec<String>,
    /// Proxy URI, if any.
    pub proxy: Option<String>,
}

/// Receives inbound message events. `Err` means the frame could not be read.
pub type ReceiveHandler = Arc<dyn Fn(TransportResult<Bytes>) + Send + Sync>;

/// Receives the numeric close code when the connection closes.
pub type CloseHandler = Arc<dyn Fn(u16) + Send + Sync>;

/// Invoked once when a connect attempt finishes.
pub type ConnectCallback = Box<dyn FnOnce(TransportResult<()>) + Send>;

/// Invoked once when a write has been flushed or has failed.
pub type WriteCallback = Box<dyn FnOnce(TransportResult<()>) + Send>;

/// Factory for connections.
pub trait Transport: Send + Sync + 'static {
    /// Create a connection object configured from `request`. Nothing is
    /// sent on the wire until [`Connection::connect`].
    fn open_connection(&self, request: ConnectRequest) -> TransportResult<Arc<dyn Connection>>;
}

/// One transport connection.
pub trait Connection: Send + Sync + 'static {
    /// Register the inbound message handler. Must precede `connect`.
    fn set_receive_handler(&self, handler: ReceiveHandler);

    /// Register the close handler. Must precede `connect`.
    fn set_close_handler(&self, handler: CloseHandler);

    /// Start connecting. `on_complete` fires exactly once, unless this call
    /// itself returns an error.
    fn connect(&self, on_complete: ConnectCallback) -> TransportResult<()>;

    /// Channel for outgoing data. Only valid once connected.
    fn write_channel(&self) -> TransportResult<Arc<dyn WriteChannel>>;

    /// Request a close with the given status code and reason.
    fn close(&self, code: u16, reason: &str) -> TransportResult<()>;
}

/// Outgoing data path of a connection.
pub trait WriteChannel: Send + Sync + 'static {
    /// Write one message and flush it. `on_complete` fires exactly once,
    /// unless this call itself returns an error.
    fn write_and_flush(
        &self,
        kind: MessageKind,
        data: Bytes,
        on_complete: WriteCallback,
    ) -> TransportResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::new(-5, "connection refused");
        assert_eq!(err.to_string(), "connection refused (code -5)");
    }

    #[test]
    fn test_connect_request_default() {
        let req = ConnectRequest::default();
        assert!(req.uri.is_empty());
        assert!(req.headers.is_empty());
        assert!(req.subprotocols.is_empty());
        assert!(req.proxy.is_none());
    }
}
