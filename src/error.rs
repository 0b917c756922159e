use thiserror::Error;

/// Errors raised by the engine.
///
/// Parse problems that only affect a single sub-clause are not errors; they
/// surface as [`crate::query::ParseDiagnostic`] values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("data already imported ({rows} rows); re-import into a populated engine is not supported")]
    AlreadyImported { rows: usize },

    #[error("header definition for column '{0}' is missing a name")]
    MissingHeader(String),

    #[error("no type plugin registered for type '{type_name}' (column '{column}')")]
    UnresolvedPlugin { column: String, type_name: String },

    #[error("headers are already bound; plugin '{0}' cannot be registered after import")]
    HeadersLocked(String),

    #[error("column '{0}' has no bound type plugin")]
    UnboundColumn(String),

    #[error("row {0} does not exist")]
    RowNotFound(usize),

    #[error("column '{0}' does not exist")]
    ColumnNotFound(String),

    #[error("column '{0}' is not editable")]
    NotEditable(String),

    #[error("column '{0}' is not sortable")]
    NotSortable(String),

    #[error("column '{0}' is not groupable")]
    NotGroupable(String),

    #[error("invalid clause for column '{column}' ({type_name}): {reason}; allowed operators: {allowed}")]
    InvalidValue {
        column: String,
        type_name: String,
        reason: String,
        allowed: String,
    },

    #[error("value '{value}' already exists in unique column '{column}'")]
    DuplicateValue { column: String, value: String },
}

pub type Result<T> = std::result::Result<T, QueryError>;
