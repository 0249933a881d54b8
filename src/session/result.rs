//! Result record produced by connect and send operations.

use crate::error::Result;

use super::Session;

/// Outcome of a connect or send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionStatus {
    /// Operation succeeded.
    Ok,
    /// Operation failed; see `platform_error_code`.
    Failed,
}

/// Record returned by a completed connect or send operation.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    /// Session the operation ran on.
    pub session: Session,
    /// Success or failure.
    pub status: CompletionStatus,
    /// Native code reported by the transport; `0` on success.
    pub platform_error_code: i32,
}

impl CompletionResult {
    pub(crate) fn from_status(session: Session, status: &Result<()>) -> Self {
        match status {
            Ok(()) => Self {
                session,
                status: CompletionStatus::Ok,
                platform_error_code: 0,
            },
            Err(err) => Self {
                session,
                status: CompletionStatus::Failed,
                platform_error_code: err.platform_code(),
            },
        }
    }

    /// Returns `true` if the operation succeeded.
    #[must_use]
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == CompletionStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_op::InlineExecutor;
    use crate::error::{Error, GENERIC_FAILURE};
    use crate::transport::MemoryTransport;
    use crate::Client;

    fn session() -> Session {
        Client::new(MemoryTransport::new(), InlineExecutor).create_session()
    }

    #[test]
    fn test_success_has_zero_code() {
        let result = CompletionResult::from_status(session(), &Ok(()));
        assert!(result.is_ok());
        assert_eq!(result.platform_error_code, 0);
    }

    #[test]
    fn test_transport_failure_keeps_code() {
        let status = Err(Error::Transport {
            code: -7,
            message: "reset".into(),
        });
        let result = CompletionResult::from_status(session(), &status);
        assert_eq!(result.status, CompletionStatus::Failed);
        assert_eq!(result.platform_error_code, -7);
    }

    #[test]
    fn test_other_failure_is_generic() {
        let status = Err(Error::Unexpected("gone".into()));
        let result = CompletionResult::from_status(session(), &status);
        assert!(!result.is_ok());
        assert_eq!(result.platform_error_code, GENERIC_FAILURE);
    }
}
