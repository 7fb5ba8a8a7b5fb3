//! Schema validation engine.
//!
//! [`validate`] evaluates a [`Schema`] against a JSON object and collects
//! every violation in field declaration order. The `nullable` and `required`
//! checks of a field run independently, so one field may report both.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::Schema;

/// A single constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum FieldViolation {
    /// A non-nullable field is absent or holds an empty value.
    NotFilled(String),
    /// A required field is not a key of the data.
    Missing(String),
}

impl FieldViolation {
    /// Returns the name of the offending field.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NotFilled(field) | Self::Missing(field) => field,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFilled(field) => write!(f, "Field {field} should be filled"),
            Self::Missing(field) => write!(f, "Field {field} should be exists"),
        }
    }
}

/// Outcome of validating one data object against one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    errors: Vec<FieldViolation>,
    filled_fields: Vec<String>,
}

impl ValidationResult {
    /// Returns `true` when no violation was found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the violations in schema declaration order.
    #[must_use]
    pub fn errors(&self) -> &[FieldViolation] {
        &self.errors
    }

    /// Returns the violations rendered as messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// Returns the first violation message, if any.
    #[must_use]
    pub fn first_error(&self) -> Option<String> {
        self.errors.first().map(ToString::to_string)
    }

    /// Returns the names of fields that were present with a non-empty value.
    #[must_use]
    pub fn filled_fields(&self) -> &[String] {
        &self.filled_fields
    }

    /// Consumes the result, returning the filled field names.
    #[must_use]
    pub fn into_filled_fields(self) -> Vec<String> {
        self.filled_fields
    }
}

/// Returns `true` if the value counts as filled.
///
/// `null`, `false`, zero, and empty strings, arrays and objects are empty.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Returns `true` if `name` is present in `data` with a truthy value.
#[must_use]
pub fn is_filled(data: &Map<String, Value>, name: &str) -> bool {
    data.get(name).is_some_and(is_truthy)
}

/// Validates `data` against `schema`.
///
/// For each field, in declaration order:
///
/// 1. `nullable = false`: absent or empty is a [`FieldViolation::NotFilled`],
///    otherwise the field is recorded as filled.
/// 2. `nullable = true`: a present, non-empty value is recorded as filled.
/// 3. `required = true`: a missing key is a [`FieldViolation::Missing`].
///
/// # Example
///
/// ```
/// use scoring_core::{schema, validate};
/// use serde_json::json;
///
/// let data = json!({"login": "h&f", "token": "", "arguments": {}, "method": ""});
/// let result = validate(&schema::METHOD_REQUEST, data.as_object().unwrap());
///
/// assert!(!result.is_valid());
/// assert_eq!(result.first_error().unwrap(), "Field method should be filled");
/// ```
#[must_use]
pub fn validate(schema: &Schema, data: &Map<String, Value>) -> ValidationResult {
    let mut result = ValidationResult::default();

    for field in schema.fields() {
        let name = field.name();
        let constraint = field.constraint();
        let filled = is_filled(data, name);

        match constraint.nullable() {
            Some(false) if !filled => {
                result.errors.push(FieldViolation::NotFilled(name.to_string()));
            }
            Some(_) if filled => result.filled_fields.push(name.to_string()),
            _ => {}
        }

        if constraint.required() == Some(true) && !data.contains_key(name) {
            result.errors.push(FieldViolation::Missing(name.to_string()));
        }
    }

    result
}
