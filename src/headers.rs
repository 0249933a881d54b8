//! Connect-request header handling.
//!
//! Custom headers keep their insertion order. Subprotocols travel through
//! the transport's negotiation mechanism rather than as a raw header, so the
//! `Sec-WebSocket-Protocol` name is filtered out when the request is built.

use crate::error::{Error, Result};

/// Header reserved for subprotocol negotiation.
pub const SUBPROTOCOL_HEADER: &str = "Sec-WebSocket-Protocol";

/// User agent header name.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Validate a header name and value.
///
/// # Errors
/// Returns `Error::InvalidArgument` for an empty name and
/// `Error::InvalidHeaderValue` if either part contains `\r` or `\n`.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument("header name is empty".into()));
    }
    if name.contains(['\r', '\n', ':']) {
        return Err(Error::InvalidHeaderValue {
            header: name.to_string(),
            reason: "name contains CR, LF or ':'".to_string(),
        });
    }
    if value.contains(['\r', '\n']) {
        return Err(Error::InvalidHeaderValue {
            header: name.to_string(),
            reason: "contains CR or LF characters".to_string(),
        });
    }
    Ok(())
}

/// Ordered list of request headers with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, String)>,
}

impl HeaderList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header. An existing entry with the same name (ignoring case)
    /// keeps its position and takes the new value; otherwise the header is
    /// appended.
    ///
    /// # Errors
    /// See [`validate_header`].
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        validate_header(name, value)?;
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            entry.1 = value.to_string();
        } else {
            self.entries.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    /// Look up a header value by name, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a header with `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Header at `index` in insertion order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&str, &str)> {
        self.entries
            .get(index)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Headers to copy onto a transport request: everything except the
    /// subprotocol header.
    #[must_use]
    pub fn request_headers(&self) -> HeaderList {
        HeaderList {
            entries: self
                .entries
                .iter()
                .filter(|(name, _)| !name.eq_ignore_ascii_case(SUBPROTOCOL_HEADER))
                .cloned()
                .collect(),
        }
    }
}

/// Split a comma separated subprotocol string into trimmed, non-empty
/// tokens, preserving order.
///
/// # Example
///
/// ```
/// use rsws_session::headers::parse_subprotocols;
///
/// assert_eq!(parse_subprotocols(" chat , ,v2.json"), vec!["chat", "v2.json"]);
/// ```
#[must_use]
pub fn parse_subprotocols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
