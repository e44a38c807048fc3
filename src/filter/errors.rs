//! Filter error types

use thiserror::Error;

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Filter errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Unrecognized comparison operator string
    #[error("Invalid filter type {0}")]
    InvalidFilterType(String),
}
