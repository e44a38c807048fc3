//! Filter descriptor types
//!
//! `FilterSpec` is the caller-supplied, recursive description of a filter
//! condition. It is a closed union: the compiler is total over it, and the
//! only fallible step is parsing an operator string at the input boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::FilterError;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompareOp {
    /// Equality (`=` or `==`)
    Eq,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Wildcard text search, value tokenized on whitespace
    Like,
    /// Regular-expression text search, tokens joined as alternatives
    RLike,
}

impl CompareOp {
    /// Canonical operator string
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Like => "like",
            CompareOp::RLike => "rlike",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompareOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "=" | "==" => Ok(CompareOp::Eq),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Lte),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Gte),
            "like" => Ok(CompareOp::Like),
            "rlike" => Ok(CompareOp::RLike),
            _ => Err(FilterError::InvalidFilterType(s.to_string())),
        }
    }
}

impl TryFrom<String> for CompareOp {
    type Error = FilterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CompareOp> for String {
    fn from(op: CompareOp) -> String {
        op.as_str().to_string()
    }
}

/// A recursive filter descriptor
///
/// Descriptors are read-only input; the compiler never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSpec {
    /// Match columns equal to the value, or null when the value is null
    Scalar(Value),
    /// Match columns whose value is in the set; a null member becomes an
    /// explicit is-null clause
    Set(Vec<Value>),
    /// Compare columns against one value with an operator
    Compare {
        /// Comparison operator
        op: CompareOp,
        /// Right-hand value
        value: Value,
    },
    /// At least one child matches
    Any(Vec<FilterSpec>),
    /// Every child matches
    All(Vec<FilterSpec>),
    /// Heterogeneous list: scalar members pool into one value set, nested
    /// members compile independently, everything ORs together
    List(Vec<FilterSpec>),
}

impl FilterSpec {
    /// Scalar equality shorthand
    pub fn scalar(value: impl Into<Value>) -> Self {
        FilterSpec::Scalar(value.into())
    }

    /// Comparison shorthand
    pub fn compare(op: CompareOp, value: impl Into<Value>) -> Self {
        FilterSpec::Compare {
            op,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_parsing() {
        assert_eq!("=".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("==".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert_eq!("LIKE".parse::<CompareOp>().unwrap(), CompareOp::Like);
        assert_eq!(">=".parse::<CompareOp>().unwrap(), CompareOp::Gte);
    }

    #[test]
    fn test_unknown_operator_names_offender() {
        let err = "~=".parse::<CompareOp>().unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterType("~=".to_string()));
        assert!(err.to_string().contains("~="));
    }

    #[test]
    fn test_operator_deserialization_rejects_unknown() {
        let ok: CompareOp = serde_json::from_value(json!("<=")).unwrap();
        assert_eq!(ok, CompareOp::Lte);

        let err = serde_json::from_value::<CompareOp>(json!("~=")).unwrap_err();
        assert!(err.to_string().contains("~="));
    }

    #[test]
    fn test_spec_round_trip() {
        let spec = FilterSpec::Any(vec![
            FilterSpec::scalar("a"),
            FilterSpec::compare(CompareOp::Gt, 10),
            FilterSpec::Set(vec![json!(1), json!(null)]),
        ]);
        let encoded = serde_json::to_value(&spec).unwrap();
        let decoded: FilterSpec = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, spec);
    }
}
