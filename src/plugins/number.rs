use std::cmp::Ordering;

use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::datavalue_compare::compare_datavalues;

const NUMBER_OPERATORS: [Operator; 8] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterThanOrEqual,
    Operator::LessThanOrEqual,
    Operator::Between,
    Operator::In,
];

/// Largest float that still converts to an integer without loss
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Integer and floating point columns
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberPlugin;

impl NumberPlugin {
    fn normalize_float(f: f64) -> DataValue {
        if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
            DataValue::Integer(f as i64)
        } else {
            DataValue::Float(f)
        }
    }
}

impl TypePlugin for NumberPlugin {
    fn name(&self) -> &str {
        "number"
    }

    fn operators(&self) -> &[Operator] {
        &NUMBER_OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        let raw = raw.trim();
        raw.chars().any(|c| c.is_ascii_digit()) && raw.parse::<f64>().is_ok()
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::Integer(_) | DataValue::Null => raw.clone(),
            DataValue::Float(f) => Self::normalize_float(*f),
            DataValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    DataValue::Null
                } else if let Ok(i) = trimmed.parse::<i64>() {
                    DataValue::Integer(i)
                } else if self.validate(trimmed) {
                    trimmed
                        .parse::<f64>()
                        .map(Self::normalize_float)
                        .unwrap_or_else(|_| raw.clone())
                } else {
                    // Unparseable cells keep their text and sort after numbers
                    raw.clone()
                }
            }
            DataValue::Boolean(b) => DataValue::Integer(i64::from(*b)),
            DataValue::DateTime(_) => raw.clone(),
        }
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        match (a, b) {
            // i64 beyond 2^53 loses precision as f64
            (DataValue::Integer(x), DataValue::Integer(y)) => x.cmp(y),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if !a.is_null() && !b.is_null() => {
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
                _ => compare_datavalues(a, b),
            },
        }
    }

    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        let numeric = |value: &DataValue| value.as_f64().is_some();
        if !numeric(data) {
            return false;
        }

        match (operator, operand) {
            (Operator::Between, Operand::Between(low, high)) if numeric(low) && numeric(high) => {
                let (low, high) = if self.compare(low, high) == Ordering::Greater {
                    (high, low)
                } else {
                    (low, high)
                };
                self.compare(data, low) != Ordering::Less
                    && self.compare(data, high) != Ordering::Greater
            }
            (_, Operand::Single(value)) if numeric(value) => {
                let ordering = self.compare(data, value);
                match operator {
                    Operator::GreaterThan => ordering == Ordering::Greater,
                    Operator::LessThan => ordering == Ordering::Less,
                    Operator::GreaterThanOrEqual => ordering != Ordering::Less,
                    Operator::LessThanOrEqual => ordering != Ordering::Greater,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(data: DataValue, operator: Operator, raw: &str) -> bool {
        let operand = NumberPlugin.parse_operand(operator, raw);
        NumberPlugin.matches(&data, operator, &operand)
    }

    #[test]
    fn test_validate() {
        assert!(NumberPlugin.validate("42"));
        assert!(NumberPlugin.validate(" -3.5 "));
        assert!(!NumberPlugin.validate("abc"));
        assert!(!NumberPlugin.validate("NaN"));
        assert!(!NumberPlugin.validate(""));
    }

    #[test]
    fn test_parse_value_canonical() {
        assert_eq!(NumberPlugin.parse_value(&"30".into()), DataValue::Integer(30));
        assert_eq!(NumberPlugin.parse_value(&DataValue::Float(30.0)), DataValue::Integer(30));
        assert_eq!(NumberPlugin.parse_value(&"2.5".into()), DataValue::Float(2.5));
        assert_eq!(NumberPlugin.parse_value(&"".into()), DataValue::Null);

        let once = NumberPlugin.parse_value(&"1e3".into());
        assert_eq!(once, DataValue::Integer(1000));
        assert_eq!(NumberPlugin.parse_value(&once), once);
    }

    #[test]
    fn test_large_integers_stay_distinct() {
        let big = DataValue::Integer(9_007_199_254_740_993);
        let below = DataValue::Integer(9_007_199_254_740_992);
        assert_eq!(NumberPlugin.compare(&big, &below), Ordering::Greater);
        assert!(!check(big.clone(), Operator::Equal, "9007199254740992"));
        assert!(check(big.clone(), Operator::Equal, "9007199254740993"));
        assert!(check(big, Operator::GreaterThan, "9007199254740992"));
    }

    #[test]
    fn test_ordering_operators() {
        assert!(check(DataValue::Integer(30), Operator::GreaterThanOrEqual, "26"));
        assert!(!check(DataValue::Integer(25), Operator::GreaterThanOrEqual, "26"));
        assert!(check(DataValue::Float(2.5), Operator::LessThan, "3"));
        assert!(check(DataValue::Integer(30), Operator::Equal, "30.0"));
        assert!(!check(DataValue::Null, Operator::GreaterThan, "0"));
    }

    #[test]
    fn test_between_is_closed() {
        assert!(check(DataValue::Integer(20), Operator::Between, "20,30"));
        assert!(check(DataValue::Integer(30), Operator::Between, "30, 20"));
        assert!(!check(DataValue::Integer(31), Operator::Between, "20,30"));
    }

    #[test]
    fn test_compare_numeric_difference() {
        assert_eq!(
            NumberPlugin.compare(&DataValue::Integer(9), &DataValue::Integer(10)),
            Ordering::Less
        );
        assert_eq!(
            NumberPlugin.compare(&DataValue::Null, &DataValue::Integer(0)),
            Ordering::Less
        );
    }
}
