//! Query execution
//!
//! A `Query` carries a projection, the predicates applied so far, ordering
//! and an optional slice; nothing touches storage until `count` or `all`.
//! Evaluation scans the cartesian product of the touched tables, so a
//! predicate spanning two tables behaves like an implicit join condition.

mod eval;
mod query;

pub(crate) use eval::{eval_column, eval_predicate};
pub use query::Query;
