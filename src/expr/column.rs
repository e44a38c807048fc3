//! Column expressions and table reachability
//!
//! A `ColumnExpr` describes one projected value of a query: a direct table
//! column, a labeled wrapper, a function call, a derived expression tracking
//! its origins, a literal, or a boolean predicate used as a column.
//!
//! Every variant can report the set of base tables it ultimately reads from,
//! which the query layer uses to decide which tables a scan must touch.

use std::collections::BTreeSet;

use serde_json::Value;

use super::predicate::Predicate;

/// Functions a column expression may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// Current timestamp, resolved at evaluation time
    Now,
    /// Lowercase a string argument
    Lower,
    /// Uppercase a string argument
    Upper,
    /// First non-null argument
    Coalesce,
}

impl Func {
    /// Returns the function name used as the default output label
    pub fn name(&self) -> &'static str {
        match self {
            Func::Now => "now",
            Func::Lower => "lower",
            Func::Upper => "upper",
            Func::Coalesce => "coalesce",
        }
    }
}

/// A column expression
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    /// A direct column of a base table
    Column {
        /// Owning table name
        table: String,
        /// Column name
        name: String,
    },
    /// A named projection of an inner expression
    Label {
        /// Output name
        name: String,
        /// Wrapped expression
        expr: Box<ColumnExpr>,
    },
    /// A function call over argument expressions
    Call {
        /// Called function
        func: Func,
        /// Argument expressions
        args: Vec<ColumnExpr>,
    },
    /// A derived expression tracking the expressions it originates from
    Derived {
        /// Origin expressions
        origins: Vec<ColumnExpr>,
    },
    /// A constant value
    Literal(Value),
    /// A boolean predicate projected as a column
    Bool(Box<Predicate>),
}

impl ColumnExpr {
    /// Direct table column
    pub fn column(table: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnExpr::Column {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Wraps this expression under an output name
    pub fn label(self, name: impl Into<String>) -> Self {
        ColumnExpr::Label {
            name: name.into(),
            expr: Box::new(self),
        }
    }

    /// Function call expression
    pub fn call(func: Func, args: Vec<ColumnExpr>) -> Self {
        ColumnExpr::Call { func, args }
    }

    /// The natural output name of this expression, if it has one
    pub fn name(&self) -> Option<&str> {
        match self {
            ColumnExpr::Column { name, .. } => Some(name),
            ColumnExpr::Label { name, .. } => Some(name),
            ColumnExpr::Call { func, .. } => Some(func.name()),
            ColumnExpr::Derived { .. } | ColumnExpr::Literal(_) | ColumnExpr::Bool(_) => None,
        }
    }

    /// The set of base tables this expression reads from.
    ///
    /// Recurses through labels, function arguments, derived origins and
    /// predicate operands; literals contribute nothing. Expressions are
    /// trees, so the walk terminates.
    pub fn tables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_tables(&mut out);
        out
    }

    pub(crate) fn collect_tables(&self, out: &mut BTreeSet<String>) {
        match self {
            ColumnExpr::Column { table, .. } => {
                out.insert(table.clone());
            }
            ColumnExpr::Label { expr, .. } => expr.collect_tables(out),
            ColumnExpr::Call { args, .. } => {
                for arg in args {
                    arg.collect_tables(out);
                }
            }
            ColumnExpr::Derived { origins } => {
                for origin in origins {
                    origin.collect_tables(out);
                }
            }
            ColumnExpr::Literal(_) => {}
            ColumnExpr::Bool(predicate) => predicate.collect_tables(out),
        }
    }
}

/// One entry of an order-by clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExpr {
    /// Expression to order by
    pub expr: ColumnExpr,
    /// Descending order when true
    pub descending: bool,
}

impl OrderExpr {
    /// Ascending order over an expression
    pub fn asc(expr: ColumnExpr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    /// Descending order over an expression
    pub fn desc(expr: ColumnExpr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{CmpOp, Operand};
    use serde_json::json;

    #[test]
    fn test_direct_column_tables() {
        let expr = ColumnExpr::column("users", "name");
        let tables = expr.tables();
        assert_eq!(tables.len(), 1);
        assert!(tables.contains("users"));
    }

    #[test]
    fn test_label_unwraps_to_inner_table() {
        let expr = ColumnExpr::column("users", "name").label("user_name");
        assert!(expr.tables().contains("users"));
        assert_eq!(expr.name(), Some("user_name"));
    }

    #[test]
    fn test_nested_labels_terminate() {
        let expr = ColumnExpr::column("users", "name")
            .label("a")
            .label("b")
            .label("c");
        assert_eq!(expr.tables().len(), 1);
    }

    #[test]
    fn test_call_unions_argument_tables() {
        let expr = ColumnExpr::call(
            Func::Coalesce,
            vec![
                ColumnExpr::column("users", "nickname"),
                ColumnExpr::column("profiles", "display_name"),
                ColumnExpr::Literal(json!("anonymous")),
            ],
        );
        let tables = expr.tables();
        assert_eq!(tables.len(), 2);
        assert!(tables.contains("users"));
        assert!(tables.contains("profiles"));
    }

    #[test]
    fn test_derived_unions_origin_tables() {
        let expr = ColumnExpr::Derived {
            origins: vec![
                ColumnExpr::column("orders", "total").label("t"),
                ColumnExpr::column("items", "price"),
            ],
        };
        let tables = expr.tables();
        assert!(tables.contains("orders"));
        assert!(tables.contains("items"));
    }

    #[test]
    fn test_literal_has_no_tables() {
        assert!(ColumnExpr::Literal(json!(1)).tables().is_empty());
    }

    #[test]
    fn test_bool_column_reaches_predicate_tables() {
        let pred = Predicate::Compare {
            column: ColumnExpr::column("events", "start_date"),
            op: CmpOp::Lte,
            value: Operand::Now,
        };
        let expr = ColumnExpr::Bool(Box::new(pred)).label("active");
        assert!(expr.tables().contains("events"));
    }
}
