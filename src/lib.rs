//! # rsws-session - Asynchronous WebSocket Session Manager
//!
//! `rsws-session` manages WebSocket sessions on top of a pluggable transport.
//! The transport owns sockets, handshake and framing; this crate owns
//! everything around them.
//!
//! ## Features
//!
//! - **Ordered delivery** with at most one write in flight per session
//! - **Uniform async operations**: connect and every send return an
//!   [`AsyncOp`] that resolves exactly once
//! - **Reference-counted sessions** kept alive by pending operations
//! - **Inbound dispatch** of text messages and close events to callbacks
//! - **Resource limits** on message size, queue depth and headers
//!
//! ## Quick Start
//!
//! ```rust
//! use rsws_session::{Client, CloseStatus, InlineExecutor, MemoryTransport};
//!
//! let client = Client::new(MemoryTransport::echo(), InlineExecutor);
//! client.set_message_function(|session, text| {
//!     println!("session {}: {}", session.id(), text);
//! });
//!
//! let session = client.create_session();
//! session.connect("ws://echo.local", "chat").unwrap().wait_blocking().unwrap();
//! session.send_message("Hello").unwrap();
//! session.disconnect(CloseStatus::Normal).unwrap();
//! ```

pub mod async_op;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod message;
pub mod session;
pub mod transport;

#[cfg(feature = "async-tokio")]
pub use async_op::TokioExecutor;
pub use async_op::{AsyncOp, AsyncProvider, Completer, Executor, InlineExecutor};
pub use client::{Client, CloseFunction, MessageFunction};
pub use config::{Config, Limits};
pub use error::{Error, ErrorKind, Result};
pub use message::{CloseStatus, MessageKind, Payload};
pub use session::{CompletionResult, CompletionStatus, Session, SessionState};
pub use transport::{
    ConnectRequest, Connection, MemoryConnection, MemoryTransport, Transport, TransportError,
    WriteChannel,
};
