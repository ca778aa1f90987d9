//! Federation error types.
//!
//! Absence of a user is never an error: lookups return `Ok(None)` and
//! searches return an empty `Vec`. Every variant here is surfaced to the
//! caller on first occurrence; federation providers do not retry.

use kc_model::StorageIdError;
use thiserror::Error;

/// Errors that can occur during federation operations.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The external store could not be reached or the driver failed.
    ///
    /// The caller may retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The external store rejected a statement.
    ///
    /// This is a programming or schema error and is not worth retrying.
    #[error("Query error: {0}")]
    Query(String),

    /// The reference does not belong to this provider or is malformed.
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// A record returned by the external store violates its invariants.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Operation not supported by this provider.
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Provider is read-only.
    #[error("Provider is read-only: cannot {0}")]
    ReadOnly(String),
}

impl FederationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a storage unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a malformed reference error.
    #[must_use]
    pub fn malformed_reference(msg: impl Into<String>) -> Self {
        Self::MalformedReference(msg.into())
    }

    /// Creates a mapping error.
    #[must_use]
    pub fn mapping(msg: impl Into<String>) -> Self {
        Self::Mapping(msg.into())
    }

    /// Creates a read-only error.
    #[must_use]
    pub fn read_only(operation: impl Into<String>) -> Self {
        Self::ReadOnly(operation.into())
    }

    /// Creates a not supported error.
    #[must_use]
    pub fn not_supported(operation: impl Into<String>) -> Self {
        Self::NotSupported(operation.into())
    }

    /// Checks if this error means the store could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    /// Checks if this error is the caller's fault (bad reference).
    #[must_use]
    pub const fn is_malformed_reference(&self) -> bool {
        matches!(self, Self::MalformedReference(_))
    }
}

impl From<StorageIdError> for FederationError {
    fn from(err: StorageIdError) -> Self {
        Self::MalformedReference(err.to_string())
    }
}

/// Result type for federation operations.
pub type FederationResult<T> = Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(FederationError::unavailable("refused").is_unavailable());
        assert!(!FederationError::query("syntax error").is_unavailable());
        assert!(FederationError::malformed_reference("x").is_malformed_reference());
        assert!(!FederationError::mapping("empty key").is_unavailable());
    }

    #[test]
    fn storage_id_errors_become_malformed_references() {
        let err: FederationError = kc_model::StorageId::parse("alice").unwrap_err().into();
        assert!(err.is_malformed_reference());
        assert!(err.to_string().contains("alice"));
    }

    #[test]
    fn messages_keep_origin() {
        let err = FederationError::unavailable("connection refused (os error 111)");
        assert_eq!(
            err.to_string(),
            "Storage unavailable: connection refused (os error 111)"
        );
    }
}
