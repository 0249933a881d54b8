//! Session handle and shared session state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::async_op::AsyncOp;
use crate::client::Client;
use crate::error::{Error, Result};
use crate::headers::HeaderList;
use crate::message::{CloseStatus, Payload};
use crate::transport::{Connection, WriteChannel};

use super::queue::OutgoingQueue;
use super::result::CompletionResult;
use super::send::OutgoingMessage;
use super::state::SessionState;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration applied when connecting.
#[derive(Default)]
pub(super) struct Setup {
    pub(super) headers: HeaderList,
    pub(super) proxy: Option<String>,
}

/// Live transport objects. The write channel is only set after a
/// successful connect.
pub(super) struct Binding {
    pub(super) connection: Option<Arc<dyn Connection>>,
    pub(super) writer: Option<Arc<dyn WriteChannel>>,
    pub(super) connect_code: i32,
}

pub(super) struct SessionInner {
    pub(super) id: u64,
    pub(super) client: Client,
    pub(super) uri: OnceLock<String>,
    pub(super) subprotocol: OnceLock<String>,
    pub(super) setup: Mutex<Setup>,
    pub(super) state: Mutex<SessionState>,
    pub(super) binding: Mutex<Binding>,
    pub(super) queue: OutgoingQueue<OutgoingMessage>,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let state = *self.state.get_mut();
        let connection = self.binding.get_mut().connection.take();
        if let Some(connection) = connection.filter(|_| state.can_close()) {
            if let Err(err) = connection.close(CloseStatus::Normal.as_u16(), "") {
                warn!(session = self.id, code = err.code, "close on drop failed: {}", err.message);
            }
        }
        debug!(session = self.id, "session destroyed");
    }
}

/// Handle to one logical WebSocket connection.
///
/// Handles are reference counted: [`acquire`](Self::acquire) (or `clone`)
/// adds a reference, [`release`](Self::release) (or dropping) removes one.
/// When the last reference goes away the session is destroyed and, if
/// still connected, its connection is closed with
/// [`CloseStatus::Normal`].
///
/// Operations in progress hold a reference of their own, so dropping every
/// caller handle never cuts a pending connect or send short.
#[derive(Clone)]
pub struct Session {
    pub(super) inner: Arc<SessionInner>,
}

/// Non-owning reference used by the transport's event handlers.
#[derive(Clone)]
pub(super) struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    pub(super) fn upgrade(&self) -> Option<Session> {
        self.inner.upgrade().map(|inner| Session { inner })
    }
}

impl Session {
    pub(crate) fn new(client: Client) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, "session created");
        Self {
            inner: Arc::new(SessionInner {
                id,
                client,
                uri: OnceLock::new(),
                subprotocol: OnceLock::new(),
                setup: Mutex::new(Setup::default()),
                state: Mutex::new(SessionState::Created),
                binding: Mutex::new(Binding {
                    connection: None,
                    writer: None,
                    connect_code: 0,
                }),
                queue: OutgoingQueue::new(),
            }),
        }
    }

    /// Process-wide unique session id.
    #[must_use]
    #[inline]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock()
    }

    /// Target URI, once `connect` has been called.
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.inner.uri.get().map(String::as_str)
    }

    /// Subprotocol string passed to `connect`.
    #[must_use]
    pub fn subprotocol(&self) -> Option<&str> {
        self.inner.subprotocol.get().map(String::as_str)
    }

    /// Client this session belongs to.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Take an additional reference.
    #[must_use]
    pub fn acquire(&self) -> Session {
        let session = self.clone();
        trace!(session = self.id(), refs = self.ref_count(), "session acquired");
        session
    }

    /// Give up this reference.
    pub fn release(self) {
        trace!(session = self.id(), refs = self.ref_count() - 1, "session released");
    }

    /// Number of live references, including those held by operations in
    /// progress.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Set a custom header sent on connect. Setting an existing name
    /// (ignoring case) replaces its value in place.
    ///
    /// # Errors
    ///
    /// - `Error::Unexpected` once `connect` has been called
    /// - `Error::TooManyHeaders` beyond `Limits::max_headers`
    /// - `Error::InvalidArgument` / `Error::InvalidHeaderValue` for an
    ///   empty name or CR/LF in the header
    pub fn set_header(&self, name: &str, value: &str) -> Result<()> {
        let state = self.inner.state.lock();
        if !state.is_configurable() {
            return Err(Error::Unexpected(format!(
                "headers cannot be changed in state {state}"
            )));
        }
        let mut setup = self.inner.setup.lock();
        if !setup.headers.contains(name) {
            self.inner
                .client
                .config()
                .limits
                .check_header_count(setup.headers.len() + 1)?;
        }
        setup.headers.set(name, value)
    }

    /// Number of custom headers.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.inner.setup.lock().headers.len()
    }

    /// Custom header at `index`, in insertion order.
    #[must_use]
    pub fn header_at(&self, index: usize) -> Option<(String, String)> {
        self.inner
            .setup
            .lock()
            .headers
            .get_index(index)
            .map(|(name, value)| (name.to_string(), value.to_string()))
    }

    /// Route the connection through `proxy`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` for an empty URI
    /// - `Error::Unexpected` once `connect` has been called
    pub fn set_proxy(&self, proxy: &str) -> Result<()> {
        if proxy.is_empty() {
            return Err(Error::InvalidArgument("proxy uri is empty".into()));
        }
        let state = self.inner.state.lock();
        if !state.is_configurable() {
            return Err(Error::Unexpected(format!(
                "proxy cannot be changed in state {state}"
            )));
        }
        self.inner.setup.lock().proxy = Some(proxy.to_string());
        Ok(())
    }

    /// Proxy URI, if one was set.
    #[must_use]
    pub fn proxy(&self) -> Option<String> {
        self.inner.setup.lock().proxy.clone()
    }

    /// Native code recorded by the last connect attempt; `0` on success.
    #[must_use]
    pub fn last_connect_code(&self) -> i32 {
        self.inner.binding.lock().connect_code
    }

    /// Messages waiting behind the one in flight.
    #[must_use]
    pub fn queued_messages(&self) -> usize {
        self.inner.queue.len()
    }

    /// Send a text message.
    ///
    /// Messages are written in the order they were queued, one at a time.
    /// The returned operation completes when the transport has flushed the
    /// message or reported a failure.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` for an empty message
    /// - `Error::MessageTooLarge` beyond `Limits::max_message_size`
    /// - `Error::Unexpected` if the session is not connected
    /// - `Error::QueueFull` beyond `Limits::max_queued_messages`
    pub fn send_message(&self, text: &str) -> Result<AsyncOp<CompletionResult>> {
        self.enqueue(Payload::text(text))
    }

    /// Send a binary message. Same ordering and errors as
    /// [`send_message`](Self::send_message).
    ///
    /// # Errors
    ///
    /// See [`send_message`](Self::send_message).
    pub fn send_binary(&self, data: impl Into<Bytes>) -> Result<AsyncOp<CompletionResult>> {
        self.enqueue(Payload::binary(data))
    }

    /// Ask the transport to close the connection with `status`.
    ///
    /// Returns once the request is issued; the close callback fires when
    /// the transport reports the close. Queued messages are neither drained
    /// nor cancelled. Calling this again while closing is a no-op.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` if the session never connected
    /// - `Error::InvalidCloseCode` for statuses that must not be sent
    /// - `Error::Transport` if the transport rejects the request; the
    ///   state is left as it was, so the call can be retried
    pub fn disconnect(&self, status: CloseStatus) -> Result<()> {
        let connection = {
            let binding = self.inner.binding.lock();
            match (&binding.connection, &binding.writer) {
                (Some(connection), Some(_)) => connection.clone(),
                _ => {
                    return Err(Error::InvalidArgument(
                        "session has no live connection".into(),
                    ));
                }
            }
        };
        if status.is_reserved() {
            return Err(Error::InvalidCloseCode(status.as_u16()));
        }
        let previous = {
            let mut state = self.inner.state.lock();
            let current = *state;
            if current.is_closing_or_closed() {
                debug!(session = self.id(), state = %current, "already closing");
                return Ok(());
            }
            *state = SessionState::Closing;
            current
        };

        info!(session = self.id(), code = status.as_u16(), "disconnecting");
        if let Err(err) = connection.close(status.as_u16(), "") {
            let mut state = self.inner.state.lock();
            if *state == SessionState::Closing {
                *state = previous;
            }
            warn!(session = self.id(), code = err.code, "close request failed: {}", err.message);
            return Err(err.into());
        }
        Ok(())
    }

    /// Close with [`CloseStatus::Normal`].
    ///
    /// # Errors
    ///
    /// See [`disconnect`](Self::disconnect).
    pub fn disconnect_normal(&self) -> Result<()> {
        self.disconnect(CloseStatus::Normal)
    }

    pub(super) fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(super) fn writer(&self) -> Option<Arc<dyn WriteChannel>> {
        self.inner.binding.lock().writer.clone()
    }

    pub(super) fn mark_closed(&self) {
        let mut state = self.inner.state.lock();
        let current = *state;
        if current != SessionState::Closed {
            trace!(session = self.id(), from = %current, "session closed");
            *state = SessionState::Closed;
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Session {}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("uri", &self.uri())
            .finish()
    }
}
