//! Connect orchestration.

use tracing::{debug, info, trace, warn};

use crate::async_op::{self, AsyncOp, AsyncProvider, Completer};
use crate::error::{Error, Result};
use crate::headers::{USER_AGENT_HEADER, parse_subprotocols};
use crate::transport::{ConnectRequest, TransportResult};

use super::dispatch;
use super::result::CompletionResult;
use super::session::Session;
use super::state::SessionState;

impl Session {
    /// Connect to `uri`, offering the comma separated `subprotocol` list.
    ///
    /// Custom headers, the client's user agent and the proxy are applied to
    /// the transport request. The returned operation completes once the
    /// transport reports the outcome; on success sends are accepted.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument` for an empty URI
    /// - `Error::Unexpected` if `connect` was already called
    /// - `Error::NotInitialized` if the executor refuses the work
    pub fn connect(&self, uri: &str, subprotocol: &str) -> Result<AsyncOp<CompletionResult>> {
        if uri.is_empty() {
            return Err(Error::InvalidArgument("uri is empty".into()));
        }
        {
            let mut state = self.inner.state.lock();
            let current = *state;
            if !current.is_configurable() {
                return Err(Error::Unexpected(format!(
                    "connect called in state {current}"
                )));
            }
            *state = SessionState::Connecting;
        }
        // Only the caller that moved the session out of `Created` gets here.
        let _ = self.inner.uri.set(uri.to_string());
        let _ = self.inner.subprotocol.set(subprotocol.to_string());

        debug!(session = self.id(), uri, "connect scheduled");
        async_op::begin(
            ConnectProvider {
                session: self.acquire(),
            },
            self.client().executor(),
        )
    }

    /// Record the write channel after the transport reports a connect.
    fn bind_writer(&self, status: TransportResult<()>) -> Result<()> {
        let connection = self
            .inner
            .binding
            .lock()
            .connection
            .clone()
            .ok_or_else(|| Error::Unexpected("connection released during connect".into()))?;
        let writer = status.and_then(|()| connection.write_channel())?;

        // Lock order: state, then binding.
        let mut state = self.inner.state.lock();
        if *state != SessionState::Connecting {
            return Err(Error::Unexpected(format!(
                "connection closed during connect (state {})",
                *state
            )));
        }
        let mut binding = self.inner.binding.lock();
        binding.writer = Some(writer);
        binding.connect_code = 0;
        *state = SessionState::Connected;
        Ok(())
    }
}

struct ConnectProvider {
    session: Session,
}

impl ConnectProvider {
    fn request(&self) -> Result<ConnectRequest> {
        let session = &self.session;
        let setup = session.inner.setup.lock();

        let mut headers = setup.headers.request_headers();
        if let Some(agent) = &session.client().config().user_agent {
            if !headers.contains(USER_AGENT_HEADER) {
                headers.set(USER_AGENT_HEADER, agent)?;
            }
        }
        for (name, value) in headers.iter() {
            trace!(session = session.id(), header = name, value, "applying header");
        }

        let subprotocols = parse_subprotocols(session.subprotocol().unwrap_or_default());
        for protocol in &subprotocols {
            trace!(session = session.id(), protocol = %protocol, "applying subprotocol");
        }

        Ok(ConnectRequest {
            uri: session.uri().unwrap_or_default().to_string(),
            headers,
            subprotocols,
            proxy: setup.proxy.clone(),
        })
    }
}

impl AsyncProvider for ConnectProvider {
    type Output = CompletionResult;

    fn do_work(&mut self, completer: Completer) -> Result<()> {
        let request = self.request()?;
        let session = &self.session;
        info!(session = session.id(), uri = %request.uri, "connecting");

        let connection = session.client().transport().open_connection(request)?;
        dispatch::register(session, connection.as_ref());
        session.inner.binding.lock().connection = Some(connection.clone());

        let weak = session.downgrade();
        connection.connect(Box::new(move |status| {
            let status = match weak.upgrade() {
                Some(session) => session.bind_writer(status),
                None => Err(Error::Unexpected("session destroyed during connect".into())),
            };
            completer.complete(status);
        }))?;
        Ok(())
    }

    fn get_result(&mut self, status: &Result<()>) -> CompletionResult {
        let session = &self.session;
        match status {
            Ok(()) => info!(session = session.id(), "connected"),
            Err(err) => {
                let code = err.platform_code();
                {
                    let mut binding = session.inner.binding.lock();
                    binding.writer = None;
                    binding.connect_code = code;
                }
                session.mark_closed();
                warn!(session = session.id(), code, "connect failed: {err}");
            }
        }
        CompletionResult::from_status(session.clone(), status)
    }
}
