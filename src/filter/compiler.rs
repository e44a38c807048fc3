//! Filter compilation
//!
//! Turns one `FilterSpec` into at most one `Predicate` over the target
//! columns. Returns `None` when the descriptor yields no constraining
//! predicate (empty value set, empty combinator, like value with no tokens).

use serde_json::Value;

use crate::expr::{CmpOp, ColumnExpr, Operand, Predicate};

use super::spec::{CompareOp, FilterSpec};

/// Compiles a filter descriptor against one or more target columns.
///
/// A descriptor targeting several columns ORs the per-column predicates
/// together, so one descriptor can search a value across many fields.
pub fn compile(columns: &[ColumnExpr], spec: &FilterSpec) -> Option<Predicate> {
    match spec {
        FilterSpec::Compare {
            op: CompareOp::Like,
            value,
        } => Predicate::any_of(columns.iter().map(|c| like_filter(c, value))),

        FilterSpec::Compare {
            op: CompareOp::RLike,
            value,
        } => Predicate::any_of(columns.iter().map(|c| rlike_filter(c, value))),

        FilterSpec::Compare { op, value } => {
            let op = match op {
                CompareOp::Eq => CmpOp::Eq,
                CompareOp::Lt => CmpOp::Lt,
                CompareOp::Lte => CmpOp::Lte,
                CompareOp::Gt => CmpOp::Gt,
                CompareOp::Gte => CmpOp::Gte,
                CompareOp::Like | CompareOp::RLike => unreachable!("handled above"),
            };
            Predicate::any_of(columns.iter().map(|c| {
                Some(Predicate::Compare {
                    column: c.clone(),
                    op,
                    value: Operand::Value(value.clone()),
                })
            }))
        }

        FilterSpec::Scalar(value) => {
            let values = std::slice::from_ref(value);
            Predicate::any_of(columns.iter().map(|c| set_filter(c, values)))
        }

        FilterSpec::Set(values) => {
            Predicate::any_of(columns.iter().map(|c| set_filter(c, values)))
        }

        FilterSpec::Any(children) => {
            Predicate::any_of(children.iter().map(|child| compile(columns, child)))
        }

        FilterSpec::All(children) => {
            Predicate::all_of(children.iter().map(|child| compile(columns, child)))
        }

        FilterSpec::List(children) => {
            // Nested descriptors compile independently; scalar members pool
            // into one value set compiled per column with the null-aware rule.
            let mut queries: Vec<Option<Predicate>> = Vec::new();
            let mut pooled: Vec<Value> = Vec::new();
            for child in children {
                match child {
                    FilterSpec::Scalar(value) => pooled.push(value.clone()),
                    nested => queries.push(compile(columns, nested)),
                }
            }
            if !pooled.is_empty() {
                queries.extend(columns.iter().map(|c| set_filter(c, &pooled)));
            }
            Predicate::any_of(queries)
        }
    }
}

/// Null-aware membership filter for one column.
///
/// SQL `IN` cannot match NULL, so a null member becomes an explicit is-null
/// clause; one remaining value becomes equality, several an `IN`.
fn set_filter(column: &ColumnExpr, values: &[Value]) -> Option<Predicate> {
    let mut distinct: Vec<Value> = Vec::new();
    let mut with_null = false;
    for value in values {
        if value.is_null() {
            with_null = true;
        } else if !distinct.contains(value) {
            distinct.push(value.clone());
        }
    }

    let mut queries: Vec<Option<Predicate>> = Vec::new();
    if with_null {
        queries.push(Some(Predicate::IsNull(column.clone())));
    }
    if distinct.len() == 1 {
        queries.push(Some(Predicate::eq(
            column.clone(),
            distinct.into_iter().next().unwrap_or(Value::Null),
        )));
    } else if !distinct.is_empty() {
        queries.push(Some(Predicate::In {
            column: column.clone(),
            values: distinct,
        }));
    }
    Predicate::any_of(queries)
}

/// Wildcard text-search filter: whitespace tokens joined as `%a%b%`.
///
/// A null value matches null columns; a value with no tokens yields nothing.
fn like_filter(column: &ColumnExpr, value: &Value) -> Option<Predicate> {
    if value.is_null() {
        return Some(Predicate::IsNull(column.clone()));
    }
    let words = tokenize(value)?;
    Some(Predicate::Like {
        column: column.clone(),
        pattern: format!("%{}%", words.join("%")),
    })
}

/// Regex text-search filter: whitespace tokens joined as `(a|b)`.
fn rlike_filter(column: &ColumnExpr, value: &Value) -> Option<Predicate> {
    if value.is_null() {
        return Some(Predicate::IsNull(column.clone()));
    }
    let words = tokenize(value)?;
    Some(Predicate::RLike {
        column: column.clone(),
        pattern: format!("({})", words.join("|")),
    })
}

/// Splits a text-search value into whitespace tokens, `None` when empty
fn tokenize(value: &Value) -> Option<Vec<String>> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if words.is_empty() {
        None
    } else {
        Some(words)
    }
}
