use thiserror::Error;

/// Core error types for work and manifest handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Incomplete resource meta for manifest {ordinal}: {message}")]
    IncompleteResourceMeta { ordinal: usize, message: String },

    #[error("Invalid apiVersion: {0}")]
    InvalidApiVersion(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new IncompleteResourceMeta error
    pub fn incomplete_resource_meta(ordinal: usize, message: impl Into<String>) -> Self {
        Self::IncompleteResourceMeta {
            ordinal,
            message: message.into(),
        }
    }

    /// Create a new InvalidApiVersion error
    pub fn invalid_api_version(api_version: impl Into<String>) -> Self {
        Self::InvalidApiVersion(api_version.into())
    }

    /// Check whether the manifest itself is malformed, as opposed to a
    /// serialization failure
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            Self::IncompleteResourceMeta { .. } | Self::InvalidApiVersion(_)
        )
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IncompleteResourceMeta { .. } | Self::InvalidApiVersion(_) => {
                ErrorCategory::Validation
            }
            Self::JsonError(_) => ErrorCategory::Serialization,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_meta_error() {
        let err = CoreError::incomplete_resource_meta(2, "missing kind");
        assert_eq!(
            err.to_string(),
            "Incomplete resource meta for manifest 2: missing kind"
        );
        assert!(err.is_manifest_error());
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let core_err: CoreError = json_err.into();

        assert!(matches!(core_err, CoreError::JsonError(_)));
        assert!(!core_err.is_manifest_error());
        assert_eq!(core_err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Serialization.to_string(), "serialization");
    }
}
