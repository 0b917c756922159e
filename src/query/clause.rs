use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plugins::Operator;

/// `<field> <operator> <value>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectClause {
    pub field: String,
    pub operator: Operator,
    /// Raw operand text, parsed by the column's plugin at evaluation
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(token: &str) -> Option<SortDirection> {
        match token.to_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: SortDirection,
}

/// Zero-based inclusive slice of the candidate list. Negative offsets count
/// from the end (`-1` is the last element); `upper: None` runs to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeClause {
    pub lower: i64,
    pub upper: Option<i64>,
}

impl RangeClause {
    /// `range N`: the first N rows, or the last N when N is negative
    pub fn first(n: i64) -> Option<RangeClause> {
        match n {
            n if n > 0 => Some(RangeClause {
                lower: 0,
                upper: Some(n - 1),
            }),
            n if n < 0 => Some(RangeClause {
                lower: n,
                upper: None,
            }),
            _ => None,
        }
    }

    /// `range A-B` / `range A-` with 1-based positive bounds
    pub fn between(lower: i64, upper: Option<i64>) -> RangeClause {
        RangeClause {
            lower: Self::offset(lower),
            upper: upper.map(Self::offset),
        }
    }

    fn offset(position: i64) -> i64 {
        if position > 0 {
            position - 1
        } else {
            position
        }
    }

    fn position(offset: i64) -> i64 {
        if offset >= 0 {
            offset.saturating_add(1)
        } else {
            offset
        }
    }

    /// Resolve against a list of `len` candidates, `None` when nothing
    /// falls inside the range
    pub fn resolve(&self, len: usize) -> Option<(usize, usize)> {
        if len == 0 {
            return None;
        }
        let len_i = len as i64;
        let absolute = |offset: i64| -> i64 {
            if offset < 0 {
                (len_i + offset).max(0)
            } else {
                offset
            }
        };

        let start = absolute(self.lower);
        let end = self.upper.map(absolute).unwrap_or(len_i - 1).min(len_i - 1);
        if start > end || start >= len_i {
            return None;
        }
        Some((start as usize, end as usize))
    }
}

impl fmt::Display for RangeClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (0, Some(upper)) if upper >= 0 => write!(f, "range {}", upper.saturating_add(1)),
            (lower, None) if lower < 0 => write!(f, "range {}", lower),
            (lower, Some(upper)) => write!(
                f,
                "range {}-{}",
                Self::position(lower),
                Self::position(upper)
            ),
            (lower, None) => write!(f, "range {}-", Self::position(lower)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupClause {
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuzzyClause {
    pub text: String,
}

/// One parsed unit of the query language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    Select(SelectClause),
    Sort(SortClause),
    Range(RangeClause),
    Group(GroupClause),
    Fuzzy(FuzzyClause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Select,
    Sort,
    Range,
    Group,
    Fuzzy,
}

impl Clause {
    pub fn kind(&self) -> ClauseKind {
        match self {
            Clause::Select(_) => ClauseKind::Select,
            Clause::Sort(_) => ClauseKind::Sort,
            Clause::Range(_) => ClauseKind::Range,
            Clause::Group(_) => ClauseKind::Group,
            Clause::Fuzzy(_) => ClauseKind::Fuzzy,
        }
    }
}

/// Quote a word so the tokenizer reads it back unchanged and never as a
/// keyword or separator
pub fn quote_word(word: &str) -> String {
    const RESERVED: [&str; 6] = ["and", "&&", "search", "group", "range", "sort"];

    let needs_quotes = word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\'))
        || RESERVED.iter().any(|r| r.eq_ignore_ascii_case(word));

    if !needs_quotes {
        return word.to_string();
    }

    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for SelectClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            quote_word(&self.field),
            self.operator,
            quote_word(&self.value)
        )
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort {} {}", quote_word(&self.field), self.direction)
    }
}

impl fmt::Display for GroupClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}", quote_word(&self.field))
    }
}

impl fmt::Display for FuzzyClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search {}", quote_word(&self.text))
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Select(c) => c.fmt(f),
            Clause::Sort(c) => c.fmt(f),
            Clause::Range(c) => c.fmt(f),
            Clause::Group(c) => c.fmt(f),
            Clause::Fuzzy(c) => c.fmt(f),
        }
    }
}
