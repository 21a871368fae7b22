//! Status feedback rule configuration and extracted values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects which named values are extracted from a resource's status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeedbackRule {
    /// Use the built-in common fields table for the resource's type.
    CommonFields,
    /// Use the listed paths verbatim.
    #[serde(rename = "JSONPaths")]
    JsonPaths {
        #[serde(rename = "jsonPaths", default)]
        json_paths: Vec<PathSpec>,
    },
}

impl FeedbackRule {
    pub fn json_paths(paths: impl IntoIterator<Item = PathSpec>) -> Self {
        Self::JsonPaths {
            json_paths: paths.into_iter().collect(),
        }
    }
}

/// A named path expression, optionally bound to one resource version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSpec {
    pub name: String,
    /// Only evaluate the path when the resource is served at this version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub path: String,
}

impl PathSpec {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            path: path.into(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Discriminant of a [`FieldValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Integer,
    String,
    Boolean,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "Integer"),
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "Boolean"),
        }
    }
}

/// A scalar value extracted from a status document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    Integer(i64),
    String(String),
    Boolean(bool),
}

impl FieldValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::String(_) => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// A named extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackValue {
    pub name: String,
    #[serde(rename = "fieldValue")]
    pub value: FieldValue,
}

impl FeedbackValue {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
