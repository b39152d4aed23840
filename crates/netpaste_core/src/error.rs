//! Error types for NetPaste core.

use netpaste_kv::KvError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Outcomes other than success from repository operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The note is password-protected and the supplied password is wrong.
    #[error("access denied to note {name:?}")]
    AccessDenied {
        /// The note name.
        name: String,
    },

    /// The commit carried a version token that is no longer current.
    #[error("version token for note {name:?} is stale, fetch the note and retry")]
    TokenMismatch {
        /// The note name.
        name: String,
    },

    /// The commit targets a note that does not exist or has expired.
    #[error("note {name:?} does not exist")]
    NotFound {
        /// The note name.
        name: String,
    },

    /// A read could not record its access because commits kept landing
    /// between the read and its write-back.
    #[error("note {name:?} changed {attempts} times during a read")]
    Contended {
        /// The note name.
        name: String,
        /// Attempts made.
        attempts: usize,
    },

    /// The key-value backend failed.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(#[from] KvError),

    /// A stored record could not be decoded or encoded.
    #[error("corrupt record for note {name:?}: {message}")]
    CorruptRecord {
        /// The note name.
        name: String,
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an access denied error.
    pub fn access_denied(name: impl Into<String>) -> Self {
        Self::AccessDenied { name: name.into() }
    }

    /// Creates a token mismatch error.
    pub fn token_mismatch(name: impl Into<String>) -> Self {
        Self::TokenMismatch { name: name.into() }
    }

    /// Creates a not found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates a contended error.
    pub fn contended(name: impl Into<String>, attempts: usize) -> Self {
        Self::Contended {
            name: name.into(),
            attempts,
        }
    }

    /// Creates a corrupt record error.
    pub fn corrupt_record(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns true if the caller can recover by re-supplying input or
    /// re-fetching the note.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. }
                | Self::TokenMismatch { .. }
                | Self::NotFound { .. }
                | Self::Contended { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_outcomes() {
        assert!(CoreError::access_denied("a").is_recoverable());
        assert!(CoreError::token_mismatch("a").is_recoverable());
        assert!(CoreError::not_found("a").is_recoverable());
        assert!(CoreError::contended("a", 3).is_recoverable());
        assert!(!CoreError::BackendUnavailable(KvError::Closed).is_recoverable());
        assert!(!CoreError::corrupt_record("a", "bad").is_recoverable());
    }

    #[test]
    fn messages_name_the_note() {
        let err = CoreError::not_found("shopping");
        assert_eq!(err.to_string(), "note \"shopping\" does not exist");
    }
}
