use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

use super::{Operand, Operator, TypePlugin};
use crate::data::datatable::DataValue;
use crate::data::datavalue_compare::compare_datavalues;

const DATE_OPERATORS: [Operator; 8] = [
    Operator::Equal,
    Operator::NotEqual,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterThanOrEqual,
    Operator::LessThanOrEqual,
    Operator::Between,
    Operator::In,
];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

// Month-first wins over day-first when both read as valid dates
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Parse the date and date-time spellings accepted in data and queries
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Date and date-time columns
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePlugin;

impl TypePlugin for DatePlugin {
    fn name(&self) -> &str {
        "date"
    }

    fn operators(&self) -> &[Operator] {
        &DATE_OPERATORS
    }

    fn validate(&self, raw: &str) -> bool {
        parse_datetime(raw).is_some()
    }

    fn parse_value(&self, raw: &DataValue) -> DataValue {
        match raw {
            DataValue::String(s) if s.trim().is_empty() => DataValue::Null,
            DataValue::String(s) => parse_datetime(s).map_or_else(|| raw.clone(), DataValue::DateTime),
            _ => raw.clone(),
        }
    }

    fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        compare_datavalues(a, b)
    }

    fn evaluate_condition(&self, data: &DataValue, operator: Operator, operand: &Operand) -> bool {
        let DataValue::DateTime(x) = data else {
            return false;
        };

        match (operator, operand) {
            (Operator::Between, Operand::Between(DataValue::DateTime(a), DataValue::DateTime(b))) => {
                let (low, high) = if a <= b { (a, b) } else { (b, a) };
                low <= x && x <= high
            }
            (_, Operand::Single(DataValue::DateTime(y))) => match operator {
                Operator::GreaterThan => x > y,
                Operator::LessThan => x < y,
                Operator::GreaterThanOrEqual => x >= y,
                Operator::LessThanOrEqual => x <= y,
                _ => false,
            },
            _ => false,
        }
    }
}
