//! Bounded access log kept on every note.
//!
//! Each successful read prepends one entry. The log keeps the most recent
//! entries only, newest first; older entries are dropped, never archived.

use serde::{Deserialize, Serialize};

/// Coarse classification of the reading client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientClass {
    /// A phone or tablet.
    #[serde(rename = "m")]
    Mobile,
    /// Anything else.
    #[serde(rename = "pc")]
    Desktop,
}

impl ClientClass {
    /// Classifies a client from its user-agent string.
    #[must_use]
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("Mobile") {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// The short label stored on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "m",
            Self::Desktop => "pc",
        }
    }
}

/// Masks a dotted address for display.
///
/// A four-part address keeps its first two and last components and has the
/// third replaced by `**`. Anything else, including IPv6, passes through.
///
/// ```rust
/// use netpaste_core::mask_origin;
///
/// assert_eq!(mask_origin("1.2.3.4"), "1.2.**.4");
/// assert_eq!(mask_origin("::1"), "::1");
/// ```
#[must_use]
pub fn mask_origin(origin: &str) -> String {
    let parts: Vec<&str> = origin.split('.').collect();
    match parts.as_slice() {
        [first, second, _, last] => format!("{first}.{second}.**.{last}"),
        _ => origin.to_string(),
    }
}

/// One read access to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Client classification.
    #[serde(rename = "client")]
    pub client_class: ClientClass,
    /// Masked origin address.
    #[serde(rename = "ip")]
    pub origin: String,
    /// Location label.
    pub location: String,
    /// When the access happened.
    #[serde(rename = "time")]
    pub timestamp: String,
}

impl AccessLogEntry {
    /// Builds an entry from the raw origin, masking it.
    #[must_use]
    pub fn new(
        client_class: ClientClass,
        raw_origin: &str,
        location: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            client_class,
            origin: mask_origin(raw_origin),
            location: location.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// Newest-first list of access entries with a fixed upper bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLog(Vec<AccessLogEntry>);

impl AccessLog {
    /// Creates a log holding a single entry.
    #[must_use]
    pub fn starting_with(entry: AccessLogEntry) -> Self {
        Self(vec![entry])
    }

    /// Returns the log with `entry` prepended, truncated to `capacity`.
    #[must_use]
    pub fn with_entry(mut self, entry: AccessLogEntry, capacity: usize) -> Self {
        self.0.insert(0, entry);
        self.0.truncate(capacity);
        self
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the log holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> &[AccessLogEntry] {
        &self.0
    }

    /// The most recent entry.
    #[must_use]
    pub fn newest(&self) -> Option<&AccessLogEntry> {
        self.0.first()
    }
}
