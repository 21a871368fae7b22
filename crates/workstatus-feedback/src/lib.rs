//! # workstatus-feedback
//!
//! Turns loosely-typed resource status documents into named scalar values.
//!
//! - [`jsonpath`]: parser and evaluator for the supported path subset
//!   (`.a.b`, `['a']`, `[0]`, `[?(@.type=="Ready")]`)
//! - [`extract`]: evaluates one path and coerces the result to a [`FieldValue`]
//! - [`rules`]: built-in common fields table and rule resolution
//! - [`StatusReader`]: applies a list of rules to one resource, collecting
//!   every error instead of stopping at the first one
//!
//! ```ignore
//! use workstatus_feedback::StatusReader;
//! use workstatus_core::{FeedbackRule, Gvk};
//!
//! let reader = StatusReader::new();
//! let outcome = reader.values_by_rules(&object, &gvk, &[FeedbackRule::CommonFields]);
//! for value in &outcome.values {
//!     println!("{} = {}", value.name, value.value);
//! }
//! ```
//!
//! [`FieldValue`]: workstatus_core::FieldValue

mod error;
pub mod extract;
pub mod jsonpath;
mod reader;
pub mod rules;

pub use error::{AggregateError, FeedbackError};
pub use extract::extract;
pub use jsonpath::{JsonPath, PathError};
pub use reader::{FeedbackOutcome, StatusReader};
pub use rules::{BuiltinRules, CommonFieldsRules, ResolvedPaths, resolve};
