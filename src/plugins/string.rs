use std::cmp::Ordering;

use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::datavalue_compare::compare_text;

const STRING_OPERATORS: [Operator; 7] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
    Operator::NotContains,
    Operator::In,
];

/// Free text columns
#[derive(Debug, Clone)]
pub struct StringPlugin {
    case_insensitive: bool,
}

impl StringPlugin {
    pub fn new(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    fn fold(&self, text: &str) -> String {
        if self.case_insensitive {
            text.to_lowercase()
        } else {
            text.to_string()
        }
    }
}

impl Default for StringPlugin {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Prefix/suffix/substring predicates shared by the text-like plugins.
/// Both sides must already be folded/normalised by the caller.
pub(crate) fn text_condition(data: &str, operator: Operator, needle: &str) -> bool {
    match operator {
        Operator::StartsWith => data.starts_with(needle),
        Operator::EndsWith => data.ends_with(needle),
        Operator::Contains => data.contains(needle),
        Operator::NotContains => !data.contains(needle),
        _ => false,
    }
}

/// Text of a canonical value, `Null` reads as empty
pub(crate) fn display_text(value: &DataValue) -> String {
    value.to_string()
}

impl TypePlugin for StringPlugin {
    fn name(&self) -> &str {
        "string"
    }

    fn operators(&self) -> &[Operator] {
        &STRING_OPERATORS
    }

    fn validate(&self, _raw: &str) -> bool {
        true
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::Null | DataValue::String(_) => raw.clone(),
            other => DataValue::String(other.to_string()),
        }
    }

    fn parse_text(&self, raw: &str) -> DataValue {
        DataValue::String(raw.to_string())
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        match (a, b) {
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            _ => compare_text(&display_text(a), &display_text(b)),
        }
    }

    fn equals(&self, a: &DataValue, b: &DataValue) -> bool {
        self.fold(&display_text(a)) == self.fold(&display_text(b))
    }

    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        match operand {
            Operand::Single(needle) => text_condition(
                &self.fold(&display_text(data)),
                operator,
                &self.fold(&display_text(needle)),
            ),
            _ => false,
        }
    }
}
