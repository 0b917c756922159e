use std::cmp::Ordering;

use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::datavalue_compare::compare_text;

const ENUM_OPERATORS: [Operator; 3] = [Operator::Equal, Operator::NotEqual, Operator::In];

/// Columns drawn from a fixed set of labels.
///
/// With declared values, input must name one of them (case-insensitively),
/// values are canonicalised to the declared spelling, and sorting follows
/// declaration order. Without them any non-empty label is accepted.
#[derive(Debug, Clone, Default)]
pub struct EnumPlugin {
    values: Option<Vec<String>>,
}

impl EnumPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: Vec<String>) -> Self {
        Self {
            values: Some(values),
        }
    }

    pub fn values(&self) -> Option<&[String]> {
        self.values.as_deref()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.values
            .as_ref()?
            .iter()
            .position(|v| v.eq_ignore_ascii_case(label.trim()))
    }
}

impl TypePlugin for EnumPlugin {
    fn name(&self) -> &str {
        "enum"
    }

    fn operators(&self) -> &[Operator] {
        &ENUM_OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        match &self.values {
            Some(_) => self.position(raw).is_some(),
            None => !raw.trim().is_empty(),
        }
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::Null => DataValue::Null,
            DataValue::String(s) if s.trim().is_empty() => DataValue::Null,
            other => {
                let label = other.to_string();
                match (self.position(&label), &self.values) {
                    (Some(pos), Some(values)) => DataValue::String(values[pos].clone()),
                    _ => DataValue::String(label.trim().to_string()),
                }
            }
        }
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        match (a, b) {
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            _ => {
                let (x, y) = (a.to_string(), b.to_string());
                match (self.position(&x), self.position(&y)) {
                    (Some(i), Some(j)) => i.cmp(&j),
                    // Undeclared labels sort after declared ones
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => compare_text(&x, &y),
                }
            }
        }
    }

    fn equals(&self, a: &DataValue, b: &DataValue) -> bool {
        a.to_string().eq_ignore_ascii_case(&b.to_string())
    }

    fn evaluate_condition(&self, _data: &DataValue, _operator: Operator, _operand: &Operand) -> bool {
        false
    }
}
