//! WebSocket sessions: connect, ordered sends, inbound dispatch and close.
//!
//! A [`Session`] is a reference-counted handle to one logical connection.
//! Every handle, and every connect or send operation still in progress,
//! keeps the session alive; the transport's event handlers do not.
//!
//! ## Session Lifecycle
//!
//! 1. **Created** - Headers and proxy may be configured
//! 2. **Connecting** - Transport connect in progress
//! 3. **Connected** - Sends accepted, inbound messages dispatched
//! 4. **Closing** - Close requested, waiting for the close event
//! 5. **Closed** - Close event received or connect failed
//!
//! ## Example
//!
//! ```rust
//! use rsws_session::{Client, CloseStatus, InlineExecutor, MemoryTransport};
//!
//! let client = Client::new(MemoryTransport::new(), InlineExecutor);
//! let session = client.create_session();
//! session.set_header("Authorization", "Bearer token").unwrap();
//!
//! let connected = session.connect("ws://example.local/chat", "chat, json").unwrap();
//! assert!(connected.wait_blocking().unwrap().is_ok());
//!
//! let sent = session.send_message("hello").unwrap();
//! assert!(sent.wait_blocking().unwrap().is_ok());
//!
//! session.disconnect(CloseStatus::Normal).unwrap();
//! ```

mod connect;
mod dispatch;
mod queue;
mod result;
mod send;
mod state;

pub use result::{CompletionResult, CompletionStatus};
pub use state::SessionState;

#[allow(clippy::module_inception)]
mod session;

pub use session::Session;
