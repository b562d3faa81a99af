//! Request field validation
//!
//! One routine, parameterized by field specs, checks a JSON payload before
//! any handler logic touches the store. It has no side effects and collects
//! every problem rather than stopping at the first.
//!
//! Presence rules:
//! - text: a non-empty JSON string
//! - numbers: an actual JSON number; `0` is present, `null` is missing

use std::fmt;

use serde_json::Value;

/// Expected shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-empty string
    Text,
    /// Any JSON number
    Number,
    /// JSON integer (no fractional part) that fits an `i64`
    Integer,
    /// `Integer` that is >= 0
    Count,
}

impl FieldKind {
    fn describe(&self) -> &'static str {
        match self {
            FieldKind::Text => "a non-empty string",
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer",
            FieldKind::Count => "a non-negative integer",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::Text => value.as_str().is_some_and(|s| !s.is_empty()),
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64(),
            FieldKind::Count => value.as_i64().is_some_and(|n| n >= 0),
        }
    }
}

/// A required field and its expected kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn number(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Number,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Integer,
        }
    }

    pub const fn count(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Count,
        }
    }
}

/// A single problem with a request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Field absent, `null`, or an empty string
    Missing(&'static str),
    /// Field present with the wrong type or range
    Malformed {
        field: &'static str,
        expected: &'static str,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::Missing(field) => write!(f, "{} is missing", field),
            ValidationIssue::Malformed { field, expected } => {
                write!(f, "{} must be {}", field, expected)
            }
        }
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Check `payload` against `specs`.
///
/// A payload that is not a JSON object has every field missing.
pub fn validate(payload: &Value, specs: &[FieldSpec]) -> Result<(), Vec<ValidationIssue>> {
    let issues: Vec<ValidationIssue> = specs
        .iter()
        .filter_map(|spec| {
            let value = payload.get(spec.name);
            if is_missing(value) {
                Some(ValidationIssue::Missing(spec.name))
            } else if !value.is_some_and(|v| spec.kind.accepts(v)) {
                Some(ValidationIssue::Malformed {
                    field: spec.name,
                    expected: spec.kind.describe(),
                })
            } else {
                None
            }
        })
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
