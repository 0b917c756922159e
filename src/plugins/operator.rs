use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::datatable::DataValue;

/// Comparison operators understood by the query language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    /// Closed interval, operand `low,high`
    Between,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
    /// List membership, operand `a,b,c`
    In,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Equal,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThanOrEqual,
        Operator::Between,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Contains,
        Operator::NotContains,
        Operator::In,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Between => "><",
            Operator::StartsWith => "%=",
            Operator::EndsWith => "=%",
            Operator::Contains => "*=",
            Operator::NotContains => "!*=",
            Operator::In => "in",
        }
    }

    pub fn parse(token: &str) -> Option<Operator> {
        Self::ALL
            .into_iter()
            .find(|op| op.symbol().eq_ignore_ascii_case(token))
    }

    /// Substring-style operators take free text rather than a typed value
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Operator::StartsWith | Operator::EndsWith | Operator::Contains | Operator::NotContains
        )
    }

    /// Render a list of operators for error messages
    pub fn list(operators: &[Operator]) -> String {
        operators
            .iter()
            .map(|op| op.symbol())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A query value parsed into the shape its operator expects
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(DataValue),
    List(Vec<DataValue>),
    Between(DataValue, DataValue),
}

/// Split a list operand on commas, dropping empty entries
pub fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Split a between operand into its two bounds
pub fn split_between(raw: &str) -> Option<(&str, &str)> {
    match split_list(raw).as_slice() {
        [low, high] => Some((*low, *high)),
        _ => None,
    }
}
