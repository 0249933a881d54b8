//! Close statuses and outgoing payload types.

use bytes::Bytes;

/// Session close status, translated from the transport's numeric close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum CloseStatus {
    /// Normal closure (1000).
    #[default]
    Normal,
    /// Endpoint going away (1001).
    GoingAway,
    /// Protocol error (1002).
    ProtocolError,
    /// Unsupported data type (1003).
    Unsupported,
    /// No status code present (1005). Never sent.
    EmptyStatus,
    /// Connection dropped without a close frame (1006). Never sent.
    AbnormalClose,
    /// Payload inconsistent with the message type (1007).
    InconsistentDatatype,
    /// Policy violation (1008).
    PolicyViolation,
    /// Message too large to process (1009).
    TooLarge,
    /// Extension negotiation failed (1010).
    NegotiateError,
    /// Server hit an unexpected condition (1011).
    ServerTerminate,
    /// Unknown failure (4000).
    UnknownError,
    /// Any other code.
    Other(u16),
}

impl CloseStatus {
    /// Create a `CloseStatus` from its numeric value.
    #[must_use]
    pub const fn from_u16(code: u16) -> Self {
        match code {
            1000 => CloseStatus::Normal,
            1001 => CloseStatus::GoingAway,
            1002 => CloseStatus::ProtocolError,
            1003 => CloseStatus::Unsupported,
            1005 => CloseStatus::EmptyStatus,
            1006 => CloseStatus::AbnormalClose,
            1007 => CloseStatus::InconsistentDatatype,
            1008 => CloseStatus::PolicyViolation,
            1009 => CloseStatus::TooLarge,
            1010 => CloseStatus::NegotiateError,
            1011 => CloseStatus::ServerTerminate,
            4000 => CloseStatus::UnknownError,
            other => CloseStatus::Other(other),
        }
    }

    /// Get the numeric value of this close status.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        match self {
            CloseStatus::Normal => 1000,
            CloseStatus::GoingAway => 1001,
            CloseStatus::ProtocolError => 1002,
            CloseStatus::Unsupported => 1003,
            CloseStatus::EmptyStatus => 1005,
            CloseStatus::AbnormalClose => 1006,
            CloseStatus::InconsistentDatatype => 1007,
            CloseStatus::PolicyViolation => 1008,
            CloseStatus::TooLarge => 1009,
            CloseStatus::NegotiateError => 1010,
            CloseStatus::ServerTerminate => 1011,
            CloseStatus::UnknownError => 4000,
            CloseStatus::Other(code) => *code,
        }
    }

    /// Check if this status is reserved and MUST NOT be sent in a close
    /// request (RFC 6455 Section 7.4.1: 1004, 1005, 1006, 1015).
    #[must_use]
    pub const fn is_reserved(&self) -> bool {
        let code = self.as_u16();
        matches!(code, 1004..=1006 | 1015)
    }
}

impl From<u16> for CloseStatus {
    fn from(code: u16) -> Self {
        CloseStatus::from_u16(code)
    }
}

/// Frame type the transport should use for an outgoing payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// UTF-8 text.
    Text,
    /// Arbitrary bytes.
    Binary,
}

/// Payload of one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    kind: MessageKind,
    data: Bytes,
}

impl Payload {
    /// Create a text payload.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Text,
            data: Bytes::from(s.into()),
        }
    }

    /// Create a binary payload.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self {
            kind: MessageKind::Binary,
            data: data.into(),
        }
    }

    /// Frame type of this payload.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cheap clone of the underlying buffer.
    #[must_use]
    pub fn bytes(&self) -> Bytes {
        self.data.clone()
    }
}
