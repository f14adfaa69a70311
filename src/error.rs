//! Error types for catalog resolution.
//!
//! All errors are strongly typed using thiserror. Note that resolution itself
//! never fails: store errors are absorbed per lookup key and surface only in
//! logs. These types cover catalog construction, configuration, and the store
//! adapter contract.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised while building entries or configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid size '{value}': expected a non-negative decimal number")]
    InvalidSize {
        value: String,
    },

    #[error("Unknown material type '{value}'")]
    UnknownMaterialType {
        value: String,
    },

    #[error("Required field '{field}' is empty")]
    EmptyField {
        field: String,
    },

    #[error("Config value '{field}' must be at least {min}, got {actual}")]
    ConfigOutOfRange {
        field: String,
        min: usize,
        actual: usize,
    },

    #[error("Invalid config: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CatalogError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Internal { .. } => false,
            Self::Storage(e) => e.is_transient(),
        }
    }
}

/// Result type alias for fallible catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_size() {
        let err = ValidationError::InvalidSize {
            value: "6mm".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("6mm"));
        assert!(msg.contains("Invalid size"));
    }

    #[test]
    fn test_validation_error_config_range() {
        let err = ValidationError::ConfigOutOfRange {
            field: "min_code_len".to_string(),
            min: 1,
            actual: 0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("min_code_len"));
        assert!(msg.contains("at least 1"));
    }

    #[test]
    fn test_catalog_error_from_validation() {
        let err: CatalogError = ValidationError::EmptyField {
            field: "id".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_catalog_error_from_storage() {
        let err: CatalogError = StorageError::ConnectionError("reset".to_string()).into();
        assert!(err.is_storage());
        assert!(err.is_retryable());

        let err: CatalogError = StorageError::DuplicateKey("e1".to_string()).into();
        assert!(err.is_storage());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_catalog_error_internal() {
        let err = CatalogError::internal("unexpected state");
        assert!(err.is_internal());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("unexpected state"));
    }
}
