//! Errors raised at the persistence and spoke boundaries.

use std::fmt;
use std::time::Duration;

/// Errors that can occur while reading or writing work records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested work does not exist.
    #[error("Work not found: {id}")]
    NotFound {
        /// The `namespace/name` of the missing work.
        id: String,
    },

    /// The record changed since it was read.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        /// The resource version the writer read.
        expected: u64,
        /// The resource version currently stored.
        actual: u64,
    },

    /// The call did not complete within its deadline.
    #[error("Storage call timed out after {}ms", .elapsed.as_millis())]
    Timeout { elapsed: Duration },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError { message: String },
}

impl StorageError {
    #[must_use]
    pub fn not_found(id: impl fmt::Display) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    #[must_use]
    pub fn version_conflict(expected: u64, actual: u64) -> Self {
        Self::VersionConflict { expected, actual }
    }

    #[must_use]
    pub fn timeout(elapsed: Duration) -> Self {
        Self::Timeout { elapsed }
    }

    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a version conflict error.
    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::VersionConflict { .. } => ErrorCategory::Conflict,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::ConnectionError { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Errors that can occur while fetching a live resource from a spoke.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpokeError {
    /// The resource does not exist on the spoke.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The spoke does not serve the requested kind.
    #[error("no resource mapping for {gvk}")]
    NoResourceMapping { gvk: String },

    /// The call did not complete within its deadline.
    #[error("fetching {resource} timed out after {}ms", .elapsed.as_millis())]
    Timeout { resource: String, elapsed: Duration },

    /// The spoke could not be reached or returned a transport failure.
    #[error("spoke unavailable: {message}")]
    Unavailable { message: String },
}

impl SpokeError {
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
        }
    }

    #[must_use]
    pub fn no_resource_mapping(gvk: impl fmt::Display) -> Self {
        Self::NoResourceMapping {
            gvk: gvk.to_string(),
        }
    }

    #[must_use]
    pub fn timeout(resource: impl fmt::Display, elapsed: Duration) -> Self {
        Self::Timeout {
            resource: resource.to_string(),
            elapsed,
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Returns `true` if the resource is known to be absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::NoResourceMapping { .. } => ErrorCategory::Mapping,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Unavailable { .. } => ErrorCategory::Infrastructure,
        }
    }
}

/// Categories of boundary errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Mapping,
    Timeout,
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Mapping => write!(f, "mapping"),
            Self::Timeout => write!(f, "timeout"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("default/web");
        assert_eq!(err.to_string(), "Work not found: default/web");

        let err = StorageError::version_conflict(3, 4);
        assert_eq!(err.to_string(), "Version conflict: expected 3, found 4");

        let err = StorageError::timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Storage call timed out after 250ms");

        let err = SpokeError::not_found("apps/v1, Kind=Deployment default/web");
        assert_eq!(err.to_string(), "apps/v1, Kind=Deployment default/web not found");
    }

    #[test]
    fn test_error_predicates() {
        assert!(StorageError::not_found("a/b").is_not_found());
        assert!(StorageError::version_conflict(1, 2).is_version_conflict());
        assert!(!StorageError::connection_error("down").is_version_conflict());

        assert!(SpokeError::not_found("x").is_not_found());
        assert!(!SpokeError::unavailable("down").is_not_found());
        assert!(!SpokeError::no_resource_mapping("v1, Kind=Thing").is_not_found());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(StorageError::not_found("a/b").category(), ErrorCategory::NotFound);
        assert_eq!(StorageError::version_conflict(1, 2).category(), ErrorCategory::Conflict);
        assert_eq!(
            SpokeError::timeout("x", Duration::from_secs(1)).category(),
            ErrorCategory::Timeout
        );
        assert_eq!(ErrorCategory::Infrastructure.to_string(), "infrastructure");
    }
}
