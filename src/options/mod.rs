//! Column registry
//!
//! An `Options` maps symbolic field names to column expressions, once per
//! logical result shape. Requests then resolve the names they want into a
//! `Columns` projection carrying the touched-table set, and order-by specs
//! into concrete order expressions.
//!
//! Relabeling is two-phase: registration stores expressions untouched, and
//! `get` wraps an expression whose own name differs from its registry key,
//! so the projection exposes the registry's name.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

use crate::expr::{ColumnExpr, OrderExpr};
use crate::schema::TableDef;

/// Result type for registry resolution
pub type OptionsResult<T> = Result<T, OptionsError>;

/// Column registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    /// Order-by against a name the registry does not know
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

/// One entry of an order-by request: a registered name and a direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Registered column name
    pub name: String,
    /// Descending order when true
    pub reverse: bool,
}

impl OrderSpec {
    /// Ascending order by a registered name
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reverse: false,
        }
    }

    /// Descending order by a registered name
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reverse: true,
        }
    }
}

/// An ordered, resolved projection with its touched-table set
#[derive(Debug, Clone, Default)]
pub struct Columns {
    /// Resolved column expressions, in request order
    pub exprs: Vec<ColumnExpr>,
    /// Union of the base tables the expressions read from
    pub tables: BTreeSet<String>,
}

impl Columns {
    /// Appends an expression and folds in its tables
    pub fn push(&mut self, expr: ColumnExpr) {
        expr.collect_tables(&mut self.tables);
        self.exprs.push(expr);
    }

    /// Number of projected columns
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Whether the projection is empty
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// Registry of symbolic field names to column expressions
#[derive(Debug, Clone, Default)]
pub struct Options {
    order: Vec<String>,
    columns: HashMap<String, ColumnExpr>,
}

impl Options {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or overwrites one mapping
    pub fn add_column(&mut self, name: impl Into<String>, expr: ColumnExpr) {
        let name = name.into();
        if !self.columns.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.columns.insert(name, expr);
    }

    /// Bulk-registers every column of a table definition.
    ///
    /// Names in `ignore` are skipped; with a prefix, columns register as
    /// `"{prefix}_{column}"`.
    pub fn add_table(&mut self, table: &TableDef, ignore: &[&str], prefix: Option<&str>) {
        for column in &table.columns {
            if ignore.contains(&column.name.as_str()) {
                continue;
            }
            let name = match prefix {
                Some(prefix) => format!("{}_{}", prefix, column.name),
                None => column.name.clone(),
            };
            self.add_column(name, table.col(&column.name));
        }
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Raw registered expression for a name, without relabeling
    pub fn column(&self, name: &str) -> Option<&ColumnExpr> {
        self.columns.get(name)
    }

    /// Resolves the requested names into a projection.
    ///
    /// Order follows the request, duplicates and unknown names drop out; an
    /// empty request resolves every registered name in registration order.
    /// An expression whose own name differs from its key is labeled here.
    pub fn get(&self, names: &[&str]) -> Columns {
        let mut requested: Vec<&str> = Vec::new();
        let source: Vec<&str> = if names.is_empty() {
            self.order.iter().map(String::as_str).collect()
        } else {
            names.to_vec()
        };
        for name in source {
            if !requested.contains(&name) {
                requested.push(name);
            }
        }

        let mut columns = Columns::default();
        for name in requested {
            if let Some(expr) = self.columns.get(name) {
                if expr.name() == Some(name) {
                    columns.push(expr.clone());
                } else {
                    columns.push(expr.clone().label(name));
                }
            }
        }
        columns
    }

    /// Resolves order-by specs into order expressions.
    ///
    /// Unlike `get`, an unknown name here is an error: silently dropping an
    /// ordering would reorder results without anyone noticing.
    pub fn structure_order_by(&self, specs: &[OrderSpec]) -> OptionsResult<Vec<OrderExpr>> {
        let mut result = Vec::with_capacity(specs.len());
        for spec in specs {
            let expr = self
                .columns
                .get(&spec.name)
                .ok_or_else(|| OptionsError::UnknownColumn(spec.name.clone()))?;
            result.push(OrderExpr {
                expr: expr.clone(),
                descending: spec.reverse,
            });
        }
        Ok(result)
    }
}
