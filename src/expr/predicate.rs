//! Compiled boolean predicates
//!
//! A `Predicate` is the output of the filter compiler: a boolean expression
//! tree over column expressions, composable with AND/OR/NOT and applied to a
//! query through `Query::filter`. The executor is the only evaluator.

use std::collections::BTreeSet;

use serde_json::Value;

use super::column::ColumnExpr;

/// Ordering comparison operators usable inside a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A constant value
    Value(Value),
    /// The current timestamp, resolved when the predicate is evaluated
    Now,
}

/// A boolean predicate over column expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Ordering comparison of a column against an operand
    Compare {
        column: ColumnExpr,
        op: CmpOp,
        value: Operand,
    },
    /// Column is null or absent
    IsNull(ColumnExpr),
    /// Column value is one of the given values
    In {
        column: ColumnExpr,
        values: Vec<Value>,
    },
    /// SQL LIKE pattern match (`%` any run, `_` one character)
    Like { column: ColumnExpr, pattern: String },
    /// Regular-expression match
    RLike { column: ColumnExpr, pattern: String },
    /// All children hold
    And(Vec<Predicate>),
    /// At least one child holds
    Or(Vec<Predicate>),
    /// Child does not hold
    Not(Box<Predicate>),
    /// Constant truth value
    Literal(bool),
}

impl Predicate {
    /// Equality against a constant
    pub fn eq(column: ColumnExpr, value: Value) -> Self {
        Predicate::Compare {
            column,
            op: CmpOp::Eq,
            value: Operand::Value(value),
        }
    }

    /// Negation
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// OR-combines predicates, skipping `None` members.
    ///
    /// A single survivor is returned unwrapped; zero survivors yield `None`.
    pub fn any_of<I>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Option<Predicate>>,
    {
        let mut survivors: Vec<Predicate> = predicates.into_iter().flatten().collect();
        match survivors.len() {
            0 => None,
            1 => survivors.pop(),
            _ => Some(Predicate::Or(survivors)),
        }
    }

    /// AND-combines predicates, skipping `None` members.
    ///
    /// A single survivor is returned unwrapped; zero survivors yield `None`.
    pub fn all_of<I>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Option<Predicate>>,
    {
        let mut survivors: Vec<Predicate> = predicates.into_iter().flatten().collect();
        match survivors.len() {
            0 => None,
            1 => survivors.pop(),
            _ => Some(Predicate::And(survivors)),
        }
    }

    /// The set of base tables this predicate reads from
    pub fn tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    pub(crate) fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::IsNull(column)
            | Predicate::In { column, .. }
            | Predicate::Like { column, .. }
            | Predicate::RLike { column, .. } => column.collect_tables(out),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.collect_tables(out);
                }
            }
            Predicate::Not(child) => child.collect_tables(out),
            Predicate::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn col(name: &str) -> ColumnExpr {
        ColumnExpr::column("t", name)
    }

    #[test]
    fn test_any_of_drops_none() {
        let result = Predicate::any_of(vec![None, None]);
        assert!(result.is_none());
    }

    #[test]
    fn test_any_of_single_survivor_unwrapped() {
        let p = Predicate::eq(col("a"), json!(1));
        let result = Predicate::any_of(vec![None, Some(p.clone())]);
        assert_eq!(result, Some(p));
    }

    #[test]
    fn test_any_of_multiple_wrapped_in_or() {
        let a = Predicate::eq(col("a"), json!(1));
        let b = Predicate::eq(col("b"), json!(2));
        let result = Predicate::any_of(vec![Some(a.clone()), Some(b.clone())]);
        assert_eq!(result, Some(Predicate::Or(vec![a, b])));
    }

    #[test]
    fn test_all_of_multiple_wrapped_in_and() {
        let a = Predicate::eq(col("a"), json!(1));
        let b = Predicate::eq(col("b"), json!(2));
        let result = Predicate::all_of(vec![Some(a.clone()), Some(b.clone())]);
        assert_eq!(result, Some(Predicate::And(vec![a, b])));
    }

    #[test]
    fn test_predicate_tables() {
        let pred = Predicate::And(vec![
            Predicate::eq(ColumnExpr::column("users", "id"), json!(1)),
            Predicate::IsNull(ColumnExpr::column("orders", "closed_at")),
        ]);
        let tables = pred.tables();
        assert!(tables.contains("users"));
        assert!(tables.contains("orders"));
    }
}
