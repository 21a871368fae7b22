//! Single-value extraction.

use serde_json::Value;
use workstatus_core::{FeedbackValue, FieldValue};

use crate::error::FeedbackError;
use crate::jsonpath::JsonPath;

/// Evaluates `path` against `document` and converts the result into a typed value.
///
/// Returns `Ok(None)` when the path resolves to nothing or to `null`. When a
/// filter matches several elements, the first match wins.
pub fn extract(
    name: &str,
    path: &str,
    document: &Value,
) -> Result<Option<FeedbackValue>, FeedbackError> {
    let parsed = JsonPath::parse(path)
        .map_err(|err| FeedbackError::parse(name, path, err.to_string()))?;

    let Some(found) = parsed.find(document).into_iter().next() else {
        return Ok(None);
    };

    let value = match found {
        Value::Null => return Ok(None),
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::String(s) => FieldValue::String(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None if n.is_u64() => return Err(FeedbackError::unsupported_type(name, "uint64")),
            None => return Err(FeedbackError::unsupported_type(name, "float64")),
        },
        Value::Array(_) => return Err(FeedbackError::non_scalar(name, "array")),
        Value::Object(_) => return Err(FeedbackError::non_scalar(name, "map")),
    };

    Ok(Some(FeedbackValue::new(name, value)))
}
