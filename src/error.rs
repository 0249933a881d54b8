//! Error types for session operations.
//!
//! Every failure folds into one of four categories (see [`ErrorKind`]):
//! invalid arguments detected before any work is scheduled, a missing
//! collaborator, a failure reported by the transport, and a session or
//! transport binding that is absent where it is required.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Platform code reported for failures that carry no native code.
pub const GENERIC_FAILURE: i32 = -1;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied an unusable argument.
    InvalidArgument,
    /// A collaborator (executor, runtime) is unavailable.
    NotInitialized,
    /// The transport reported a failure.
    Transport,
    /// Required state is missing.
    Unexpected,
}

/// Errors that can occur during session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Invalid argument supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required collaborator is not available.
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    /// Transport reported a failure.
    #[error("Transport failure ({code}): {message}")]
    Transport {
        /// Native error code.
        code: i32,
        /// Description from the transport.
        message: String,
    },

    /// Session or transport binding missing where required.
    #[error("Unexpected state: {0}")]
    Unexpected(String),

    /// Outgoing message exceeds the configured maximum.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual payload size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Outgoing queue is at capacity.
    #[error("Outgoing queue full (max: {max} messages)")]
    QueueFull {
        /// Maximum queue depth.
        max: usize,
    },

    /// Too many custom headers on a session.
    #[error("Too many headers: {count} (max: {max})")]
    TooManyHeaders {
        /// Header count after the insert.
        count: usize,
        /// Maximum allowed headers.
        max: usize,
    },

    /// Close status that must not be sent.
    #[error("Invalid close code: {0}")]
    InvalidCloseCode(u16),

    /// Header value rejected.
    #[error("Invalid header value for '{header}': {reason}")]
    InvalidHeaderValue {
        /// Header name.
        header: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Result requested before the operation completed.
    #[error("Operation still pending")]
    OperationPending,

    /// Result already retrieved.
    #[error("Operation result already consumed")]
    ResultConsumed,
}

impl Error {
    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(_)
            | Error::MessageTooLarge { .. }
            | Error::TooManyHeaders { .. }
            | Error::InvalidCloseCode(_)
            | Error::InvalidHeaderValue { .. } => ErrorKind::InvalidArgument,
            Error::NotInitialized(_) => ErrorKind::NotInitialized,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Unexpected(_)
            | Error::QueueFull { .. }
            | Error::OperationPending
            | Error::ResultConsumed => ErrorKind::Unexpected,
        }
    }

    /// Native code to report in a completion record.
    #[must_use]
    pub const fn platform_code(&self) -> i32 {
        match self {
            Error::Transport { code, .. } => *code,
            _ => GENERIC_FAILURE,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport {
            code: err.code,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MessageTooLarge {
            size: 20_000_000,
            max: 16_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Message too large: 20000000 bytes (max: 16000000)"
        );
    }

    #[test]
    fn test_error_from_transport() {
        let err: Error = TransportError::new(42, "socket reset").into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.platform_code(), 42);
        assert_eq!(err.to_string(), "Transport failure (42): socket reset");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::InvalidArgument("uri".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(Error::InvalidCloseCode(1005).kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            Error::NotInitialized("runtime".into()).kind(),
            ErrorKind::NotInitialized
        );
        assert_eq!(Error::Unexpected("binding".into()).kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_non_transport_errors_use_generic_code() {
        assert_eq!(
            Error::InvalidArgument("x".into()).platform_code(),
            GENERIC_FAILURE
        );
        assert_eq!(Error::ResultConsumed.platform_code(), GENERIC_FAILURE);
    }

    #[test]
    fn test_error_clone() {
        let err = Error::OperationPending;
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
