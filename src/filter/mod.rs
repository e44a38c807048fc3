//! Filter descriptors and the filter compiler
//!
//! Callers describe filters with `FilterSpec`, a closed tagged union, and
//! `compile` turns one descriptor into a single `Predicate` over one or more
//! target columns. Multi-column targets OR across columns ("match this value
//! in any of these fields"); separate `compile` results applied to the same
//! query AND together.

mod compiler;
mod errors;
mod spec;

pub use compiler::compile;
pub use errors::{FilterError, FilterResult};
pub use spec::{CompareOp, FilterSpec};
