use std::cmp::Ordering;

use super::string::text_condition;
use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::type_inference::TypeInference;

const PHONE_OPERATORS: [Operator; 7] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
    Operator::NotContains,
    Operator::In,
];

/// Phone-number columns. Values keep their formatting for display; all
/// comparisons look at the digits only, so "+1 (555) 010-2000" equals
/// "15550102000".
#[derive(Debug, Clone, Copy, Default)]
pub struct PhonePlugin;

fn digits(value: &DataValue) -> String {
    value
        .to_string()
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

impl TypePlugin for PhonePlugin {
    fn name(&self) -> &str {
        "phone"
    }

    fn operators(&self) -> &[Operator] {
        &PHONE_OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        let raw = raw.trim();
        TypeInference::looks_like_phone(raw) || (!raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()))
    }

    fn validate_operand(&self, operator: Operator, raw: &str) -> bool {
        if operator.is_textual() {
            return raw.chars().any(|c| c.is_ascii_digit());
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
            DataValue::Null => DataValue::Null,
            other => DataValue::String(other.to_string()),
        }
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        match (a, b) {
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            _ => {
                let (x, y) = (digits(a), digits(b));
                // Shorter numbers first, then digit order
                x.len().cmp(&y.len()).then_with(|| x.cmp(&y))
            }
        }
    }

    fn equals(&self, a: &DataValue, b: &DataValue) -> bool {
        a.is_null() == b.is_null() && digits(a) == digits(b)
    }

    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        match operand {
            Operand::Single(needle) => text_condition(&digits(data), operator, &digits(needle)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(data: &str, operator: Operator, raw: &str) -> bool {
        let operand = PhonePlugin.parse_operand(operator, raw);
        PhonePlugin.matches(&PhonePlugin.parse_value(&data.into()), operator, &operand)
    }

    #[test]
    fn test_digit_comparison() {
        assert!(check("+1 (555) 010-2000", Operator::Equal, "15550102000"));
        assert!(check("+1 (555) 010-2000", Operator::StartsWith, "1555"));
        assert!(check("555-010-2000", Operator::Contains, "010-20"));
        assert!(check("555-010-2000", Operator::NotContains, "999"));
    }

    #[test]
    fn test_validation() {
        assert!(PhonePlugin.validate("555-010-2000"));
        assert!(PhonePlugin.validate("911"));
        assert!(!PhonePlugin.validate("call me"));
        assert!(PhonePlugin.validate_operand(Operator::Contains, "010"));
        assert!(!PhonePlugin.validate_operand(Operator::Contains, "abc"));
    }

    #[test]
    fn test_compare_by_digits() {
        assert_eq!(
            PhonePlugin.compare(&"555-0100".into(), &"(555) 0101".into()),
            Ordering::Less
        );
    }
}
