//! Repository configuration.

use netpaste_kv::DEFAULT_TOKEN_FIELD;

/// Configuration for a [`crate::NoteRepository`].
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Prefix prepended to every note name to form its backend key.
    pub key_prefix: String,

    /// Lifetime, in seconds, given to newly created notes.
    pub default_ttl_seconds: u64,

    /// Maximum number of entries kept in a note's access log.
    pub access_log_capacity: usize,

    /// Location label written into access log entries.
    pub location_label: String,

    /// Record field the atomic script compares.
    pub token_field: String,

    /// How many times a read retries its bookkeeping write-back when a
    /// commit lands in between.
    pub read_retry_limit: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            key_prefix: "note:".to_string(),
            default_ttl_seconds: 30 * 24 * 60 * 60, // 30 days
            access_log_capacity: 20,
            location_label: "local".to_string(),
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            read_retry_limit: 16,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend key prefix.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets the lifetime of newly created notes.
    #[must_use]
    pub fn default_ttl_seconds(mut self, seconds: u64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    /// Sets the access log capacity.
    #[must_use]
    pub fn access_log_capacity(mut self, capacity: usize) -> Self {
        self.access_log_capacity = capacity;
        self
    }

    /// Sets the read write-back retry limit.
    #[must_use]
    pub fn read_retry_limit(mut self, limit: usize) -> Self {
        self.read_retry_limit = limit;
        self
    }

    /// Sets the location label of access log entries.
    #[must_use]
    pub fn location_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = label.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RepositoryConfig::default();
        assert_eq!(config.key_prefix, "note:");
        assert_eq!(config.default_ttl_seconds, 2_592_000);
        assert_eq!(config.access_log_capacity, 20);
        assert_eq!(config.token_field, "note_token");
        assert_eq!(config.read_retry_limit, 16);
    }

    #[test]
    fn builder_pattern() {
        let config = RepositoryConfig::new()
            .key_prefix("paste:")
            .default_ttl_seconds(60)
            .access_log_capacity(5)
            .location_label("lab");

        assert_eq!(config.key_prefix, "paste:");
        assert_eq!(config.default_ttl_seconds, 60);
        assert_eq!(config.access_log_capacity, 5);
        assert_eq!(config.location_label, "lab");
    }
}
