//! Error types for SemQL encoding.

use thiserror::Error;

use crate::token::Symbol;

/// The main error type for SemQL operations.
#[derive(Debug, Error)]
pub enum SemqlError {
    /// Comparison operator the grammar has no production for.
    #[error("Unsupported operator: '{0}'")]
    UnsupportedOperator(&'static str),

    /// Negated operator other than `not like` / `not in`.
    #[error("Unsupported negated operator: 'not {0}'")]
    UnsupportedNegation(&'static str),

    /// Literal-carrying filter whose operand is a sub-query.
    #[error("Operator '{0}' cannot compare against a nested query")]
    UnsupportedNesting(&'static str),

    /// More WHERE conditions than the grammar can combine.
    #[error("Too many WHERE conditions: {count} (at most {max} supported)")]
    TooManyConditions { count: usize, max: usize },

    /// More than one of INTERSECT / UNION / EXCEPT on the same query.
    #[error("Conflicting set operations: {0}")]
    ConflictingSetOperations(String),

    /// A token choice outside the enumeration of its symbol.
    #[error("Choice {choice} out of range for {symbol} (expected < {limit})")]
    ChoiceOutOfRange {
        symbol: Symbol,
        choice: usize,
        limit: usize,
    },

    /// Column id not present in the schema.
    #[error("Unknown column id {0}")]
    UnknownColumn(usize),

    /// Table id not present in the schema.
    #[error("Unknown table id {0}")]
    UnknownTable(usize),

    /// Column that has no owning table (only `*` should lack one).
    #[error("Column id {0} has no owning table")]
    UnownedColumn(usize),

    /// Database id not present in the schema file.
    #[error("Unknown database: '{0}'")]
    UnknownDatabase(String),

    /// Structurally invalid query representation.
    #[error("Malformed query: {0}")]
    Malformed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SemqlError {
    /// Create a malformed-query error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Whether the error comes from the grammar rejecting the input, as
    /// opposed to I/O or configuration trouble.
    pub fn is_unsupported_input(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedOperator(_)
                | Self::UnsupportedNegation(_)
                | Self::UnsupportedNesting(_)
                | Self::TooManyConditions { .. }
                | Self::ConflictingSetOperations(_)
                | Self::ChoiceOutOfRange { .. }
        )
    }
}

/// Result type alias for SemQL operations.
pub type SemqlResult<T> = Result<T, SemqlError>;
