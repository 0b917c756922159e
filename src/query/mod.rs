//! Query language
//!
//! Tokenizer, clause types, parser and the structured builder behind the
//! engine's incremental query API.

pub mod builder;
pub mod clause;
pub mod parser;
pub mod tokenizer;

pub use builder::QueryBuilder;
pub use clause::{
    quote_word, Clause, ClauseKind, FuzzyClause, GroupClause, RangeClause, SelectClause,
    SortClause, SortDirection,
};
pub use parser::{parse_range_spec, DiagnosticKind, ParseDiagnostic, ParsedQuery, QueryParser};
pub use tokenizer::{Token, Tokenizer};
