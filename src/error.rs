//! Error taxonomy for the spreadsheet-backed data layer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for stitchdesk.
///
/// Every layer speaks this taxonomy so callers can branch on recovery
/// strategy instead of string-matching messages.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Broken deployment: bad credentials, missing tab, malformed env.
    /// Fatal, not retryable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caller asked for an entity the registry does not know.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Network or remote-store failure that may succeed on retry.
    #[error("Transient store error: {0}")]
    Transient(String),

    /// No row carries the requested primary key.
    #[error("Not found: {entity} '{id}'")]
    NotFound { entity: String, id: String },

    /// Write payload does not cover every expected column. A short row
    /// would silently shift later columns, so this is rejected before
    /// any network call.
    #[error("Column arity mismatch for {entity}: expected {expected} values, got {got}")]
    ColumnArity {
        entity: String,
        expected: usize,
        got: usize,
    },

    /// The row changed between read and write; the caller must re-read
    /// and retry the whole cycle.
    #[error("Concurrent modification: {entity} '{id}' changed since it was read")]
    ConcurrentModification { entity: String, id: String },

    /// Status or payment state machine rejected the move.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Remote store returned a payload we cannot interpret.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Request payload failed validation before reaching the store.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        StoreError::Configuration(msg.into())
    }

    /// Create an unknown entity error
    pub fn unknown_entity<S: Into<String>>(entity: S) -> Self {
        StoreError::UnknownEntity(entity.into())
    }

    /// Create a transient error
    pub fn transient<S: Into<String>>(msg: S) -> Self {
        StoreError::Transient(msg.into())
    }

    /// Create a not found error
    pub fn not_found<E: Into<String>, I: Into<String>>(entity: E, id: I) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a column arity error
    pub fn column_arity<S: Into<String>>(entity: S, expected: usize, got: usize) -> Self {
        StoreError::ColumnArity {
            entity: entity.into(),
            expected,
            got,
        }
    }

    /// Create a concurrent modification error
    pub fn concurrent_modification<E: Into<String>, I: Into<String>>(entity: E, id: I) -> Self {
        StoreError::ConcurrentModification {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid transition error
    pub fn invalid_transition<S: Into<String>>(msg: S) -> Self {
        StoreError::InvalidTransition(msg.into())
    }

    /// Create a decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        StoreError::Decode(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        StoreError::InvalidRequest(msg.into())
    }

    /// Whether a retry with backoff can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StoreError::not_found("orders", "01J8ZQ");
        assert_eq!(err.to_string(), "Not found: orders '01J8ZQ'");
    }

    #[test]
    fn test_column_arity_display() {
        let err = StoreError::column_arity("orders", 17, 16);
        assert_eq!(
            err.to_string(),
            "Column arity mismatch for orders: expected 17 values, got 16"
        );
    }

    #[test]
    fn test_concurrent_modification_display() {
        let err = StoreError::concurrent_modification("orders", "o-1");
        assert_eq!(
            err.to_string(),
            "Concurrent modification: orders 'o-1' changed since it was read"
        );
    }

    #[test]
    fn test_transient_is_retryable() {
        assert!(StoreError::transient("timeout").is_transient());
        assert!(!StoreError::configuration("bad token").is_transient());
        assert!(!StoreError::not_found("orders", "o-1").is_transient());
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = StoreError::invalid_transition("order already delivered");
        assert_eq!(err.to_string(), "Invalid transition: order already delivered");
    }
}
