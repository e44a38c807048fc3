//! Registry and engine error types

use thiserror::Error;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for engine and session operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Registry errors; declaration-time failures are startup-fatal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Read against a logical database name never declared
    #[error("Logical database not registered: {0}")]
    NotRegistered(String),

    /// Connection url without a scheme
    #[error("Invalid connection url: {0}")]
    InvalidUrl(String),

    /// DDL failure during initialization
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Storage engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Operation against a table the engine never created
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Repeated index creation; swallowed during initialization
    #[error("Index {index} already exists on table {table}")]
    IndexAlreadyExists { table: String, index: String },

    /// Value does not fit the declared column type
    #[error("Column {table}.{column} expects {expected}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: &'static str,
    },

    /// Null or absent value for a non-nullable column
    #[error("Column {table}.{column} is not nullable")]
    NotNullable { table: String, column: String },

    /// Value for a column the table does not declare
    #[error("Unknown column {column} on table {table}")]
    UnknownColumn { table: String, column: String },

    /// Row values must be JSON objects
    #[error("Row for table {0} is not an object")]
    InvalidRow(String),
}
