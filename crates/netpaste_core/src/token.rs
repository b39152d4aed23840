//! Note identifiers and version tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque optimistic-lock value.
///
/// A fresh token is minted on creation and on every successful commit. Tokens
/// are only ever compared for equality; they carry no ordering.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Mints a new random token (32 lowercase hex characters).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps a token received from a caller.
    #[must_use]
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionToken({})", self.0)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionToken {
    fn from(token: &str) -> Self {
        Self::from_string(token)
    }
}

impl From<String> for VersionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Generates a note identifier (16 lowercase hex characters).
#[must_use]
pub fn generate_note_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}
