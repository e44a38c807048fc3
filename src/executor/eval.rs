//! Row-level evaluation of expressions and predicates
//!
//! A row context maps table names to the row each table contributes. A
//! column of a table absent from the context evaluates to null, which no
//! comparison satisfies.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::expr::{
    compare_values, like_match, rlike_match, CmpOp, ColumnExpr, Func, Operand, Predicate,
};

/// Evaluates a column expression against one row context
pub(crate) fn eval_column(
    expr: &ColumnExpr,
    ctx: &HashMap<&str, &Value>,
    now: DateTime<Utc>,
) -> Value {
    match expr {
        ColumnExpr::Column { table, name } => ctx
            .get(table.as_str())
            .and_then(|row| row.get(name))
            .cloned()
            .unwrap_or(Value::Null),
        ColumnExpr::Label { expr, .. } => eval_column(expr, ctx, now),
        ColumnExpr::Call { func, args } => eval_call(*func, args, ctx, now),
        // A derived expression projects its first origin
        ColumnExpr::Derived { origins } => origins
            .first()
            .map(|origin| eval_column(origin, ctx, now))
            .unwrap_or(Value::Null),
        ColumnExpr::Literal(value) => value.clone(),
        ColumnExpr::Bool(predicate) => Value::Bool(eval_predicate(predicate, ctx, now)),
    }
}

fn eval_call(
    func: Func,
    args: &[ColumnExpr],
    ctx: &HashMap<&str, &Value>,
    now: DateTime<Utc>,
) -> Value {
    match func {
        Func::Now => Value::String(now.to_rfc3339()),
        Func::Lower => match args.first().map(|a| eval_column(a, ctx, now)) {
            Some(Value::String(s)) => Value::String(s.to_lowercase()),
            _ => Value::Null,
        },
        Func::Upper => match args.first().map(|a| eval_column(a, ctx, now)) {
            Some(Value::String(s)) => Value::String(s.to_uppercase()),
            _ => Value::Null,
        },
        Func::Coalesce => args
            .iter()
            .map(|a| eval_column(a, ctx, now))
            .find(|v| !v.is_null())
            .unwrap_or(Value::Null),
    }
}

/// Evaluates a predicate against one row context
pub(crate) fn eval_predicate(
    predicate: &Predicate,
    ctx: &HashMap<&str, &Value>,
    now: DateTime<Utc>,
) -> bool {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let lhs = eval_column(column, ctx, now);
            if lhs.is_null() {
                return false;
            }
            let rhs = match value {
                Operand::Value(value) => value.clone(),
                Operand::Now => Value::String(now.to_rfc3339()),
            };
            match compare_values(&lhs, &rhs) {
                Some(ordering) => match op {
                    CmpOp::Eq => ordering == Ordering::Equal,
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Lte => ordering != Ordering::Greater,
                    CmpOp::Gt => ordering == Ordering::Greater,
                    CmpOp::Gte => ordering != Ordering::Less,
                },
                None => false,
            }
        }
        Predicate::IsNull(column) => eval_column(column, ctx, now).is_null(),
        Predicate::In { column, values } => {
            let lhs = eval_column(column, ctx, now);
            !lhs.is_null() && values.contains(&lhs)
        }
        Predicate::Like { column, pattern } => match eval_column(column, ctx, now) {
            Value::String(s) => like_match(&s, pattern),
            _ => false,
        },
        Predicate::RLike { column, pattern } => match eval_column(column, ctx, now) {
            Value::String(s) => rlike_match(&s, pattern),
            _ => false,
        },
        Predicate::And(children) => children.iter().all(|c| eval_predicate(c, ctx, now)),
        Predicate::Or(children) => children.iter().any(|c| eval_predicate(c, ctx, now)),
        Predicate::Not(child) => !eval_predicate(child, ctx, now),
        Predicate::Literal(value) => *value,
    }
}
