//! Query expression model
//!
//! The closed set of expression shapes the rest of the crate composes:
//! column expressions (what a query projects), predicates (what a query
//! filters by), and the value comparison rules both share.
//!
//! # Design Principles
//!
//! - Closed unions: every consumer matches exhaustively, no structural probing
//! - Expressions are trees, never graphs; traversal always terminates
//! - SQL-flavored null semantics: null satisfies no comparison, only `IsNull`

mod column;
mod predicate;
mod value;

pub use column::{ColumnExpr, Func, OrderExpr};
pub use predicate::{CmpOp, Operand, Predicate};
pub use value::{compare_values, like_match, parse_instant, rlike_match, sort_compare};
