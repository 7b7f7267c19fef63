//! Error types for identity resolution.
//!
//! Lookups that find nothing are not errors: every single-entity lookup returns
//! `Option`. The variants here cover failures of the external transports,
//! references that cannot be parsed, and invalid deployment configuration.

use crate::config::ConfigurationError;
use crate::database::DatabaseError;
use crate::directory::DirectoryError;

/// Main error type for identity resolution operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The directory transport failed (connection lost, server error, ...)
    #[error("Directory backend error: {0}")]
    Directory(#[from] DirectoryError),

    /// The relational transport failed
    #[error("Database backend error: {0}")]
    Database(#[from] DatabaseError),

    /// A membership value could not be parsed as a distinguished name
    #[error("Malformed directory reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    /// The deployment configuration is invalid or incomplete
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl IdentityError {
    /// Create a malformed reference error.
    pub fn malformed_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure came from an unreachable or failing backend.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::Directory(_) | Self::Database(_))
    }
}

/// Result type for identity resolution operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_classification() {
        let err: IdentityError = DirectoryError::unavailable("connection refused").into();
        assert!(err.is_backend_unavailable());
        assert!(err.to_string().contains("connection refused"));

        let err = IdentityError::malformed_reference("cn=", "empty attribute value");
        assert!(!err.is_backend_unavailable());
        assert_eq!(
            err.to_string(),
            "Malformed directory reference 'cn=': empty attribute value"
        );
    }
}
