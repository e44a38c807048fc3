//! Temporal activity filters
//!
//! Predicates over optional `start_date`/`end_date` columns. A null bound is
//! an open interval end: a record with no dates at all is always active.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::expr::{CmpOp, ColumnExpr, Operand, Predicate};
use crate::schema::TableDef;

fn instant(at: DateTime<Utc>) -> Operand {
    Operand::Value(Value::String(at.to_rfc3339()))
}

fn cmp(column: ColumnExpr, op: CmpOp, value: Operand) -> Predicate {
    Predicate::Compare { column, op, value }
}

/// Records active right now.
///
/// For every table: `(start_date <= now OR start_date IS NULL) AND
/// (end_date > now OR end_date IS NULL)`.
pub fn active_now(tables: &[&TableDef]) -> Predicate {
    let mut queries = Vec::with_capacity(tables.len() * 2);
    for table in tables {
        let start = table.col("start_date");
        let end = table.col("end_date");
        queries.push(Predicate::Or(vec![
            cmp(start.clone(), CmpOp::Lte, Operand::Now),
            Predicate::IsNull(start),
        ]));
        queries.push(Predicate::Or(vec![
            cmp(end.clone(), CmpOp::Gt, Operand::Now),
            Predicate::IsNull(end),
        ]));
    }
    Predicate::And(queries)
}

/// Records not active right now
pub fn inactive_now(tables: &[&TableDef]) -> Predicate {
    active_now(tables).not()
}

/// Records whose interval intersects `[start, end]`.
///
/// An unbounded record (both dates null) is active during any period; a
/// bounded record is active unless it ends before the period starts or
/// starts after it ends.
pub fn active_during(table: &TableDef, start: DateTime<Utc>, end: DateTime<Utc>) -> Predicate {
    let start_date = table.col("start_date");
    let end_date = table.col("end_date");
    Predicate::Or(vec![
        Predicate::And(vec![
            Predicate::IsNull(start_date.clone()),
            Predicate::IsNull(end_date.clone()),
        ]),
        Predicate::Or(vec![
            cmp(end_date, CmpOp::Lt, instant(start)),
            cmp(start_date, CmpOp::Gt, instant(end)),
        ])
        .not(),
    ])
}

/// Activity as a projected column named `"active"`.
///
/// With `None` the column evaluates `active_now`; with `Some` it is the
/// given constant, forcing a known value without evaluating dates.
pub fn active_column(tables: &[&TableDef], active: Option<bool>) -> ColumnExpr {
    match active {
        None => ColumnExpr::Bool(Box::new(active_now(tables))).label("active"),
        Some(value) => ColumnExpr::Literal(Value::Bool(value)).label("active"),
    }
}
