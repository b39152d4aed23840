//! The atomic token-compare script.
//!
//! Backends run this check while they hold their keyspace lock, which makes
//! the read/compare/write sequence of a commit indivisible.

use crate::error::{KvError, KvResult};
use serde_json::Value;

/// Field name the script compares when none is configured.
pub const DEFAULT_TOKEN_FIELD: &str = "note_token";

/// Compares a token field inside a stored JSON object.
///
/// A stored object without the field never matches. A stored value that is
/// not a JSON object cannot be evaluated and is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareTokenScript {
    token_field: String,
}

impl CompareTokenScript {
    /// Creates a script comparing `token_field`.
    #[must_use]
    pub fn new(token_field: impl Into<String>) -> Self {
        Self {
            token_field: token_field.into(),
        }
    }

    /// Returns the compared field name.
    #[must_use]
    pub fn token_field(&self) -> &str {
        &self.token_field
    }

    /// Returns whether `stored` carries `expected` in the token field.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::Script`] if `stored` is not a JSON object.
    pub fn matches(&self, stored: &str, expected: &str) -> KvResult<bool> {
        let value: Value = serde_json::from_str(stored)
            .map_err(|e| KvError::script(format!("stored value is not JSON: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| KvError::script("stored value is not a JSON object"))?;

        Ok(match object.get(&self.token_field) {
            Some(Value::String(token)) => token == expected,
            _ => false,
        })
    }
}

impl Default for CompareTokenScript {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FIELD)
    }
}
