//! Feedback extraction errors.

use std::fmt;
use workstatus_core::Gvk;

/// Errors raised while resolving rules or extracting a single value.
///
/// Each error is scoped to one path or one rule; callers aggregate them so a
/// bad rule never hides values produced by its siblings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackError {
    /// The path expression does not parse.
    #[error("failed to parse json path {path} of {name} with error: {message}")]
    Parse {
        name: String,
        path: String,
        message: String,
    },

    /// The path resolved to a map or an array.
    #[error("the value for {name} is not a single value: found {found}")]
    NonScalar { name: String, found: &'static str },

    /// The path resolved to a scalar that is not an integer, string or boolean.
    #[error("the type {type_name} of the value for {name} is not supported")]
    UnsupportedType {
        name: String,
        type_name: &'static str,
    },

    /// No built-in common fields rule is registered for the type.
    #[error("cannot find the CommonFields statuses for resource with gvk {gvk}")]
    NoBuiltinRule { gvk: Gvk },

    /// An explicit path is bound to a version the resource is not served at.
    #[error("version set in the path {name} is not matched for the related resource")]
    VersionMismatch { name: String },
}

impl FeedbackError {
    pub fn parse(
        name: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            name: name.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn non_scalar(name: impl Into<String>, found: &'static str) -> Self {
        Self::NonScalar {
            name: name.into(),
            found,
        }
    }

    pub fn unsupported_type(name: impl Into<String>, type_name: &'static str) -> Self {
        Self::UnsupportedType {
            name: name.into(),
            type_name,
        }
    }

    pub fn no_builtin_rule(gvk: Gvk) -> Self {
        Self::NoBuiltinRule { gvk }
    }

    pub fn version_mismatch(name: impl Into<String>) -> Self {
        Self::VersionMismatch { name: name.into() }
    }

    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    #[must_use]
    pub fn is_extraction_error(&self) -> bool {
        matches!(self, Self::NonScalar { .. } | Self::UnsupportedType { .. })
    }

    #[must_use]
    pub fn is_resolution_error(&self) -> bool {
        matches!(self, Self::NoBuiltinRule { .. } | Self::VersionMismatch { .. })
    }
}

/// Several feedback errors reported as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateError(Vec<FeedbackError>);

impl AggregateError {
    /// Returns `None` when there is nothing to report.
    pub fn from_errors(errors: Vec<FeedbackError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self(errors))
        }
    }

    pub fn errors(&self) -> &[FeedbackError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            errors => {
                write!(f, "[")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{err}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl std::error::Error for AggregateError {}
