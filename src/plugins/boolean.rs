use std::cmp::Ordering;

use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::datavalue_compare::compare_datavalues;

const BOOLEAN_OPERATORS: [Operator; 3] = [Operator::Equal, Operator::NotEqual, Operator::In];

/// True/false columns
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanPlugin;

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl TypePlugin for BooleanPlugin {
    fn name(&self) -> &str {
        "boolean"
    }

    fn operators(&self) -> &[Operator] {
        &BOOLEAN_OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        parse_flag(raw).is_some()
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::String(s) if s.trim().is_empty() => DataValue::Null,
            DataValue::String(s) => parse_flag(s).map_or_else(|| raw.clone(), DataValue::Boolean),
            DataValue::Integer(0) => DataValue::Boolean(false),
            DataValue::Integer(1) => DataValue::Boolean(true),
            _ => raw.clone(),
        }
    }

    /// `false` sorts before `true`
    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        compare_datavalues(a, b)
    }

    fn evaluate_condition(&self, _data: &DataValue, _operator: Operator, _operand: &Operand) -> bool {
        false
    }
}
