//! Shared context for sessions.
//!
//! A [`Client`] bundles the configuration, the transport, the executor and
//! one callback table. Every session created from a client reports inbound
//! messages and close events through that single pair of callbacks.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::async_op::Executor;
use crate::config::Config;
use crate::message::CloseStatus;
use crate::session::Session;
use crate::transport::Transport;

/// Callback for inbound text messages.
pub type MessageFunction = Arc<dyn Fn(&Session, &str) + Send + Sync>;

/// Callback for close events.
pub type CloseFunction = Arc<dyn Fn(&Session, CloseStatus) + Send + Sync>;

#[derive(Clone, Default)]
struct Functions {
    message: Option<MessageFunction>,
    close: Option<CloseFunction>,
}

struct ClientShared {
    config: Config,
    transport: Arc<dyn Transport>,
    executor: Arc<dyn Executor>,
    functions: RwLock<Functions>,
}

/// Entry point: creates sessions and holds their callback table.
///
/// Cloning a `Client` is cheap; clones share the callback table.
///
/// ## Example
///
/// ```rust
/// use rsws_session::{Client, InlineExecutor, MemoryTransport};
///
/// let client = Client::new(MemoryTransport::echo(), InlineExecutor);
/// client.set_message_function(|session, text| {
///     println!("session {} got {}", session.id(), text);
/// });
///
/// let session = client.create_session();
/// let result = session.connect("ws://echo.local", "").unwrap().wait_blocking().unwrap();
/// assert!(result.is_ok());
/// session.send_message("hello").unwrap();
/// ```
#[derive(Clone)]
pub struct Client {
    shared: Arc<ClientShared>,
}

impl Client {
    /// Create a client with the default configuration.
    pub fn new(transport: impl Transport, executor: impl Executor) -> Self {
        Self::with_config(Config::default(), transport, executor)
    }

    /// Create a client with `config`.
    pub fn with_config(config: Config, transport: impl Transport, executor: impl Executor) -> Self {
        Self {
            shared: Arc::new(ClientShared {
                config,
                transport: Arc::new(transport),
                executor: Arc::new(executor),
                functions: RwLock::new(Functions::default()),
            }),
        }
    }

    /// Create a client that runs operations on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// `Error::NotInitialized` when called outside a tokio runtime.
    #[cfg(feature = "async-tokio")]
    pub fn tokio(config: Config, transport: impl Transport) -> crate::Result<Self> {
        let executor = crate::async_op::TokioExecutor::current()?;
        Ok(Self::with_config(config, transport, executor))
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Create a new session in the `Created` state.
    #[must_use]
    pub fn create_session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Replace both callbacks. `None` clears the corresponding slot.
    pub fn set_functions(&self, message: Option<MessageFunction>, close: Option<CloseFunction>) {
        *self.shared.functions.write() = Functions { message, close };
    }

    /// Set the inbound message callback.
    pub fn set_message_function<F>(&self, f: F)
    where
        F: Fn(&Session, &str) + Send + Sync + 'static,
    {
        self.shared.functions.write().message = Some(Arc::new(f));
    }

    /// Set the close callback.
    pub fn set_close_function<F>(&self, f: F)
    where
        F: Fn(&Session, CloseStatus) + Send + Sync + 'static,
    {
        self.shared.functions.write().close = Some(Arc::new(f));
    }

    pub(crate) fn message_function(&self) -> Option<MessageFunction> {
        self.shared.functions.read().message.clone()
    }

    pub(crate) fn close_function(&self) -> Option<CloseFunction> {
        self.shared.functions.read().close.clone()
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.shared.transport.as_ref()
    }

    pub(crate) fn executor(&self) -> &dyn Executor {
        self.shared.executor.as_ref()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let functions = self.shared.functions.read();
        f.debug_struct("Client")
            .field("config", &self.shared.config)
            .field("message_function", &functions.message.is_some())
            .field("close_function", &functions.close.is_some())
            .finish()
    }
}
