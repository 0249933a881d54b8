//! Session lifecycle states.

/// Lifecycle state of a session.
///
/// `Created → Connecting → Connected → Closing → Closed`. A failed connect
/// goes straight from `Connecting` to `Closed`, and a transport close event
/// moves any state to `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Created; headers and proxy may still be changed.
    #[default]
    Created,
    /// Connect in progress.
    Connecting,
    /// Connected; sends are accepted.
    Connected,
    /// Close requested, waiting for the transport's close event.
    Closing,
    /// Closed or failed to connect.
    Closed,
}

impl SessionState {
    /// Returns `true` while the session may still be configured.
    #[must_use]
    #[inline]
    pub const fn is_configurable(&self) -> bool {
        matches!(self, SessionState::Created)
    }

    /// Returns `true` while a close request would be meaningful.
    #[must_use]
    #[inline]
    pub const fn can_close(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    /// Returns `true` for `Closing` and `Closed`.
    #[must_use]
    #[inline]
    pub const fn is_closing_or_closed(&self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Created => write!(f, "Created"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(SessionState::default(), SessionState::Created);
    }

    #[test]
    fn test_is_configurable() {
        assert!(SessionState::Created.is_configurable());
        assert!(!SessionState::Connecting.is_configurable());
        assert!(!SessionState::Connected.is_configurable());
        assert!(!SessionState::Closed.is_configurable());
    }

    #[test]
    fn test_can_close() {
        assert!(!SessionState::Created.can_close());
        assert!(!SessionState::Connecting.can_close());
        assert!(SessionState::Connected.can_close());
        assert!(!SessionState::Closing.can_close());
        assert!(!SessionState::Closed.can_close());
    }

    #[test]
    fn test_is_closing_or_closed() {
        assert!(!SessionState::Connected.is_closing_or_closed());
        assert!(SessionState::Closing.is_closing_or_closed());
        assert!(SessionState::Closed.is_closing_or_closed());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Created.to_string(), "Created");
        assert_eq!(SessionState::Connecting.to_string(), "Connecting");
        assert_eq!(SessionState::Connected.to_string(), "Connected");
        assert_eq!(SessionState::Closing.to_string(), "Closing");
        assert_eq!(SessionState::Closed.to_string(), "Closed");
    }
}
