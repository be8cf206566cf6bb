//! Field-level validation primitives shared by the entity schemas.
//!
//! A [`FieldReader`] walks a decoded JSON body one field at a time and records
//! every constraint it sees broken, so a single request reports all offending
//! fields at once instead of stopping at the first one.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Inclusive numeric bounds applied to a number field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Bounds {
    /// Any finite number.
    pub const ANY: Bounds = Bounds {
        min: None,
        max: None,
    };
    /// Prices, counts and other quantities that cannot go below zero.
    pub const NON_NEGATIVE: Bounds = Bounds {
        min: Some(0.0),
        max: None,
    };
    /// Percentages such as cap rate or cash-on-cash return.
    pub const PERCENT: Bounds = Bounds {
        min: Some(0.0),
        max: Some(100.0),
    };

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// What went wrong with a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// A required field is absent.
    Missing,
    /// The field is present but holds the wrong JSON type.
    WrongType { expected: &'static str },
    /// A number falls outside its allowed range.
    OutOfRange { bounds: Bounds },
    /// The value is not a syntactically valid email address.
    InvalidEmail,
    /// The value has the right type but the wrong shape.
    InvalidFormat { expected: &'static str },
    /// The request body is not a JSON object.
    NotAnObject,
    /// The raw input could not be decoded at all.
    Malformed { reason: String },
}

/// A broken constraint on one named field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Human-readable description of the violation.
    pub fn message(&self) -> String {
        match &self.kind {
            ViolationKind::Missing => "Field required".to_string(),
            ViolationKind::WrongType { expected } => format!("Input should be {}", expected),
            ViolationKind::OutOfRange { bounds } => match (bounds.min, bounds.max) {
                (Some(min), Some(max)) => {
                    format!("Input should be between {} and {}", min, max)
                }
                (Some(min), None) => {
                    format!("Input should be greater than or equal to {}", min)
                }
                (None, Some(max)) => format!("Input should be less than or equal to {}", max),
                (None, None) => "Input should be a finite number".to_string(),
            },
            ViolationKind::InvalidEmail => "Value is not a valid email address".to_string(),
            ViolationKind::InvalidFormat { expected } => format!("Input should be {}", expected),
            ViolationKind::NotAnObject => "Input should be a JSON object".to_string(),
            ViolationKind::Malformed { reason } => reason.clone(),
        }
    }
}

/// Serialized form of a violation in a 422 response body.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ViolationDetail {
    pub field: String,
    pub message: String,
}

impl From<&FieldViolation> for ViolationDetail {
    fn from(violation: &FieldViolation) -> Self {
        Self {
            field: violation.field.clone(),
            message: violation.message(),
        }
    }
}

/// Ordered list of every violation found in one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    /// A single violation, for inputs rejected before field-level checks run.
    pub fn single(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self(vec![FieldViolation::new(field, kind)])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldViolation> {
        self.0.iter()
    }

    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.field.as_str()).collect()
    }

    pub fn details(&self) -> Vec<ViolationDetail> {
        self.0.iter().map(ViolationDetail::from).collect()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message()))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for Violations {}

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    // RFC 5322 simplified: local@label(.label)+
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .expect("email regex is valid")
});

/// Checks standard email syntax.
///
/// The local part may not start or end with a dot nor contain two dots in a
/// row, and the domain needs at least one dot.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }

    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }

    EMAIL_REGEX.is_match(email)
}

/// Reads typed fields out of a JSON object, collecting violations as it goes.
///
/// Required getters return a placeholder default when the field is invalid;
/// [`FieldReader::finish`] discards the built value in that case.
pub struct FieldReader<'a> {
    object: Option<&'a Map<String, Value>>,
    violations: Vec<FieldViolation>,
}

impl<'a> FieldReader<'a> {
    pub fn new(input: &'a Value) -> Self {
        match input.as_object() {
            Some(object) => Self {
                object: Some(object),
                violations: Vec::new(),
            },
            None => Self {
                object: None,
                violations: vec![FieldViolation::new("body", ViolationKind::NotAnObject)],
            },
        }
    }

    fn violate(&mut self, field: &str, kind: ViolationKind) {
        self.violations.push(FieldViolation::new(field, kind));
    }

    /// Present, non-null value of a field. `null` counts as absent.
    fn lookup(&self, field: &str) -> Option<&'a Value> {
        self.object
            .and_then(|object| object.get(field))
            .filter(|value| !value.is_null())
    }

    fn require(&mut self, field: &str) -> Option<&'a Value> {
        // A non-object body is already reported once; skip per-field noise.
        self.object?;
        let value = self.lookup(field);
        if value.is_none() {
            self.violate(field, ViolationKind::Missing);
        }
        value
    }

    fn as_str(&mut self, field: &str, value: &Value) -> Option<String> {
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.violate(
                    field,
                    ViolationKind::WrongType {
                        expected: "a valid string",
                    },
                );
                None
            }
        }
    }

    fn as_number(&mut self, field: &str, value: &Value, bounds: Bounds) -> Option<f64> {
        let Some(number) = value.as_f64() else {
            self.violate(
                field,
                ViolationKind::WrongType {
                    expected: "a valid number",
                },
            );
            return None;
        };
        if !bounds.contains(number) {
            self.violate(field, ViolationKind::OutOfRange { bounds });
            return None;
        }
        Some(number)
    }

    fn as_integer(&mut self, field: &str, value: &Value, bounds: Bounds) -> Option<i64> {
        let integer = value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        });
        let Some(integer) = integer else {
            self.violate(
                field,
                ViolationKind::WrongType {
                    expected: "a valid integer",
                },
            );
            return None;
        };
        if !bounds.contains(integer as f64) {
            self.violate(field, ViolationKind::OutOfRange { bounds });
            return None;
        }
        Some(integer)
    }

    pub fn required_str(&mut self, field: &str) -> String {
        self.require(field)
            .and_then(|value| self.as_str(field, value))
            .unwrap_or_default()
    }

    pub fn optional_str(&mut self, field: &str) -> Option<String> {
        self.lookup(field).and_then(|value| self.as_str(field, value))
    }

    /// Required string of exactly `len` ASCII letters, e.g. a US state code.
    pub fn required_letters(&mut self, field: &str, len: usize, expected: &'static str) -> String {
        let Some(value) = self.require(field) else {
            return String::new();
        };
        let Some(s) = self.as_str(field, value) else {
            return String::new();
        };
        if s.len() != len || !s.chars().all(|c| c.is_ascii_alphabetic()) {
            self.violate(field, ViolationKind::InvalidFormat { expected });
            return String::new();
        }
        s
    }

    pub fn required_email(&mut self, field: &str) -> String {
        let Some(value) = self.require(field) else {
            return String::new();
        };
        let Some(email) = self.as_str(field, value) else {
            return String::new();
        };
        if !is_valid_email(&email) {
            self.violate(field, ViolationKind::InvalidEmail);
            return String::new();
        }
        email
    }

    pub fn required_number(&mut self, field: &str, bounds: Bounds) -> f64 {
        self.require(field)
            .and_then(|value| self.as_number(field, value, bounds))
            .unwrap_or_default()
    }

    pub fn optional_number(&mut self, field: &str, bounds: Bounds) -> Option<f64> {
        self.lookup(field)
            .and_then(|value| self.as_number(field, value, bounds))
    }

    pub fn optional_integer(&mut self, field: &str, bounds: Bounds) -> Option<i64> {
        self.lookup(field)
            .and_then(|value| self.as_integer(field, value, bounds))
    }

    /// Sequence of strings; absent or `null` yields an empty list.
    pub fn string_list(&mut self, field: &str) -> Vec<String> {
        let Some(value) = self.lookup(field) else {
            return Vec::new();
        };
        let Some(items) = value.as_array() else {
            self.violate(
                field,
                ViolationKind::WrongType {
                    expected: "a valid list",
                },
            );
            return Vec::new();
        };

        let mut strings = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => strings.push(s.to_string()),
                None => self.violate(
                    &format!("{}[{}]", field, index),
                    ViolationKind::WrongType {
                        expected: "a valid string",
                    },
                ),
            }
        }
        strings
    }

    /// Returns `value` if no field was violated, otherwise every violation.
    pub fn finish<T>(self, value: T) -> Result<T, Violations> {
        if self.violations.is_empty() {
            Ok(value)
        } else {
            Err(Violations(self.violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("test.user@example.com"));
        assert!(is_valid_email("user+tag@example.co.uk"));
        assert!(is_valid_email("user_name@example-domain.com"));
        assert!(is_valid_email("jane@example.com"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@examplecom"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user @example.com"));
        assert!(!is_valid_email("user@exam ple.com"));
        assert!(!is_valid_email("user..name@example.com"));
        assert!(!is_valid_email(".user@example.com"));
        assert!(!is_valid_email("user.@example.com"));
        assert!(!is_valid_email("user@-example.com"));
    }

    #[test]
    fn test_overlong_local_part_rejected() {
        let email = format!("{}@example.com", "a".repeat(65));
        assert!(!is_valid_email(&email));
    }

    #[test]
    fn test_non_object_body_reports_single_violation() {
        let input = json!(["not", "an", "object"]);
        let mut reader = FieldReader::new(&input);
        let _ = reader.required_str("name");
        let err = reader.finish(()).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);
        assert_eq!(err.iter().next().unwrap().kind, ViolationKind::NotAnObject);
    }

    #[test]
    fn test_null_optional_is_absent() {
        let input = json!({"source": null, "images": null});
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.optional_str("source"), None);
        assert!(reader.string_list("images").is_empty());
        assert!(reader.finish(()).is_ok());
    }

    #[test]
    fn test_null_required_is_missing() {
        let input = json!({"name": null});
        let mut reader = FieldReader::new(&input);
        let _ = reader.required_str("name");
        let err = reader.finish(()).unwrap_err();
        assert_eq!(err.iter().next().unwrap().kind, ViolationKind::Missing);
    }

    #[test]
    fn test_integer_accepts_whole_floats_only() {
        let input = json!({"a": 4.0, "b": 4.5, "c": -1});
        let mut reader = FieldReader::new(&input);
        assert_eq!(reader.optional_integer("a", Bounds::NON_NEGATIVE), Some(4));
        assert_eq!(reader.optional_integer("b", Bounds::NON_NEGATIVE), None);
        assert_eq!(reader.optional_integer("c", Bounds::NON_NEGATIVE), None);
        let err = reader.finish(()).unwrap_err();
        assert_eq!(err.fields(), vec!["b", "c"]);
    }

    #[test]
    fn test_list_element_errors_are_indexed() {
        let input = json!({"markets": ["Austin, TX", 7, "Dallas, TX"]});
        let mut reader = FieldReader::new(&input);
        let markets = reader.string_list("markets");
        assert_eq!(markets, vec!["Austin, TX", "Dallas, TX"]);
        let err = reader.finish(()).unwrap_err();
        assert_eq!(err.fields(), vec!["markets[1]"]);
    }

    #[test]
    fn test_out_of_range_message() {
        let violation = FieldViolation::new(
            "cap_rate",
            ViolationKind::OutOfRange {
                bounds: Bounds::PERCENT,
            },
        );
        assert_eq!(violation.message(), "Input should be between 0 and 100");
    }

    #[test]
    fn test_malformed_message_is_the_reason() {
        let violations = Violations::single(
            "body",
            ViolationKind::Malformed {
                reason: "JSON decode error: EOF".to_string(),
            },
        );
        let details = violations.details();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "body");
        assert_eq!(details[0].message, "JSON decode error: EOF");
    }
}
