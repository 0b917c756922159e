use std::cmp::Ordering;

use super::string::StringPlugin;
use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::type_inference::TypeInference;

/// E-mail address columns. Text semantics, always case-insensitive, with
/// full-address validation for equality operands.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailPlugin;

impl EmailPlugin {
    fn text() -> StringPlugin {
        StringPlugin::new(true)
    }
}

impl TypePlugin for EmailPlugin {
    fn name(&self) -> &str {
        "email"
    }

    fn operators(&self) -> &[Operator] {
        // Same operator set as plain text
        const OPERATORS: [Operator; 7] = [
            Operator::Equal,
            Operator::NotEqual,
            Operator::StartsWith,
            Operator::EndsWith,
            Operator::Contains,
            Operator::NotContains,
            Operator::In,
        ];
        &OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        TypeInference::looks_like_email(raw.trim())
    }

    fn validate_operand(&self, operator: Operator, raw: &str) -> bool {
        if operator.is_textual() {
            return !raw.trim().is_empty();
        }
        match operator {
            Operator::In => {
                let items = super::split_list(raw);
                !items.is_empty() && items.iter().all(|item| self.validate(item))
            }
            _ => self.validate(raw),
        }
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::String(s) if s.trim().is_empty() => DataValue::Null,
            DataValue::String(s) => DataValue::String(s.trim().to_string()),
            other => Self::text().parse_value(other),
        }
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        Self::text().compare(a, b)
    }

    fn equals(&self, a: &DataValue, b: &DataValue) -> bool {
        Self::text().equals(a, b)
    }

    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        Self::text().evaluate_condition(data, operator, operand)
    }
}
