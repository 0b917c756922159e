//! Column type detection used when headers do not declare a type
//!
//! The detected type maps onto one of the built-in plugin names so an
//! auto-detected column binds exactly like a declared one.

use regex::Regex;
use std::sync::LazyLock;

use crate::data::datatable::DataValue;

/// Static compiled regex patterns for date detection
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // YYYY-MM-DD (year must be 19xx or 20xx, month 01-12, day 01-31)
        Regex::new(r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").unwrap(),
        // MM/DD/YYYY
        Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])/(19|20)\d{2}$").unwrap(),
        // DD/MM/YYYY
        Regex::new(r"^(0[1-9]|[12]\d|3[01])/(0[1-9]|1[0-2])/(19|20)\d{2}$").unwrap(),
        // YYYY/MM/DD
        Regex::new(r"^(19|20)\d{2}/(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])$").unwrap(),
        // YYYY-MM-DD HH:MM[:SS] or ISO 8601 with T separator, optional fraction and zone
        Regex::new(
            r"^(19|20)\d{2}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])[T ]\d{2}:\d{2}(:\d{2})?(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
        )
        .unwrap(),
    ]
});

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d(][\d\s().\-]*\d$").unwrap());

/// Minimum digit count for a value to read as a phone number
const MIN_PHONE_DIGITS: usize = 7;

/// Detected data type for a value or column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    Boolean,
    Number,
    DateTime,
    Email,
    Phone,
    String,
    Null,
}

impl InferredType {
    /// Name of the built-in plugin handling this type
    pub fn type_name(self) -> &'static str {
        match self {
            InferredType::Boolean => "boolean",
            InferredType::Number => "number",
            InferredType::DateTime => "date",
            InferredType::Email => "email",
            InferredType::Phone => "phone",
            InferredType::String | InferredType::Null => "string",
        }
    }
}

/// Type inference utilities
pub struct TypeInference;

impl TypeInference {
    /// Infer the type of a single string value.
    ///
    /// Order of checks matters: cheap comparisons first, regexes last.
    pub fn infer_from_string(value: &str) -> InferredType {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return InferredType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return InferredType::Boolean;
        }

        // "inf" and "NaN" parse as floats but are words in a grid
        if value.chars().any(|c| c.is_ascii_digit()) && value.parse::<f64>().is_ok() {
            return InferredType::Number;
        }

        if Self::looks_like_datetime(value) {
            return InferredType::DateTime;
        }

        if Self::looks_like_email(value) {
            return InferredType::Email;
        }

        if Self::looks_like_phone(value) {
            return InferredType::Phone;
        }

        InferredType::String
    }

    pub fn infer_from_value(value: &DataValue) -> InferredType {
        match value {
            DataValue::Null => InferredType::Null,
            DataValue::Boolean(_) => InferredType::Boolean,
            DataValue::Integer(_) | DataValue::Float(_) => InferredType::Number,
            DataValue::DateTime(_) => InferredType::DateTime,
            DataValue::String(s) => Self::infer_from_string(s),
        }
    }

    /// Check if a string looks like a datetime value
    ///
    /// Uses strict patterns so ID strings like "ORDER-2024-001" stay strings
    pub fn looks_like_datetime(value: &str) -> bool {
        if value.len() < 8 || value.len() > 35 {
            return false;
        }
        DATE_PATTERNS.iter().any(|pattern| pattern.is_match(value))
    }

    pub fn looks_like_email(value: &str) -> bool {
        EMAIL_PATTERN.is_match(value)
    }

    pub fn looks_like_phone(value: &str) -> bool {
        PHONE_PATTERN.is_match(value)
            && value.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
    }

    /// Merge two types when a column has mixed types
    ///
    /// Rules:
    /// - Same type -> keep it
    /// - Null with anything -> the other type
    /// - Number + Phone -> Phone (unformatted phone numbers parse as numbers)
    /// - Everything else -> String
    pub fn merge_types(type1: InferredType, type2: InferredType) -> InferredType {
        use InferredType::*;

        match (type1, type2) {
            (t1, t2) if t1 == t2 => t1,
            (Null, t) | (t, Null) => t,
            (Number, Phone) | (Phone, Number) => Phone,
            _ => String,
        }
    }

    /// Infer the type of a whole column from its values
    pub fn infer_column<'a, I>(values: I) -> InferredType
    where
        I: Iterator<Item = &'a DataValue>,
    {
        let mut result_type = InferredType::Null;

        for value in values {
            result_type = Self::merge_types(result_type, Self::infer_from_value(value));

            // Early exit if we've degraded to String
            if result_type == InferredType::String {
                break;
            }
        }

        result_type
    }
}
