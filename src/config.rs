//! Configuration and limits for WebSocket sessions.

/// Resource limits applied to every session of a client.
///
/// These bound the memory a single session can pin while messages wait for
/// the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a single outgoing message in bytes.
    ///
    /// Default: 16 MB (16 * 1024 * 1024)
    pub max_message_size: usize,

    /// Maximum number of messages waiting in a session's outgoing queue,
    /// not counting the one in flight.
    ///
    /// Default: 1024
    pub max_queued_messages: usize,

    /// Maximum number of custom headers on a session.
    ///
    /// Default: 64
    pub max_headers: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_message_size: 16 * 1024 * 1024, // 16 MB
            max_queued_messages: 1024,
            max_headers: 64,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_message_size: usize, max_queued_messages: usize, max_headers: usize) -> Self {
        Self {
            max_message_size,
            max_queued_messages,
            max_headers,
        }
    }

    /// Create limits suitable for small embedded systems.
    ///
    /// - Max message: 64 KB
    /// - Max queued: 32
    /// - Max headers: 16
    #[must_use]
    pub const fn embedded() -> Self {
        Self {
            max_message_size: 64 * 1024,
            max_queued_messages: 32,
            max_headers: 16,
        }
    }

    /// Create limits for unrestricted use.
    ///
    /// Warning: Use only in trusted environments.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            max_message_size: usize::MAX,
            max_queued_messages: usize::MAX,
            max_headers: usize::MAX,
        }
    }

    /// Validate that message size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`](crate::Error::MessageTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_message_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_message_size {
            Err(crate::Error::MessageTooLarge {
                size,
                max: self.max_message_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that one more message fits behind `queued` waiting ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueFull`](crate::Error::QueueFull) if the queue is at capacity.
    pub const fn check_queue_depth(&self, queued: usize) -> Result<(), crate::Error> {
        if queued >= self.max_queued_messages {
            Err(crate::Error::QueueFull {
                max: self.max_queued_messages,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that header count is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TooManyHeaders`](crate::Error::TooManyHeaders) if `count` exceeds the configured maximum.
    pub const fn check_header_count(&self, count: usize) -> Result<(), crate::Error> {
        if count > self.max_headers {
            Err(crate::Error::TooManyHeaders {
                count,
                max: self.max_headers,
            })
        } else {
            Ok(())
        }
    }
}

/// Client configuration shared by every session it creates.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// User agent sent on connect when the session sets no `User-Agent`
    /// header of its own.
    ///
    /// Default: None
    pub user_agent: Option<String>,
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the default user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}
