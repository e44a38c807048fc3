//! Query building and execution
//!
//! A query is assembled by value: `filter` narrows (each call ANDs with the
//! previous ones), `order_by` and `slice` shape the fetch. `count` ignores
//! both ordering and slice, so a page can reuse one query for its count and
//! its fetch.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::expr::{sort_compare, OrderExpr, Predicate};
use crate::options::Columns;
use crate::registry::{Engine, EngineError};

use super::eval::{eval_column, eval_predicate};

/// A composable query over one engine
#[derive(Debug, Clone)]
pub struct Query {
    engine: Arc<Engine>,
    columns: Columns,
    predicates: Vec<Predicate>,
    order: Vec<OrderExpr>,
    range: Option<(usize, usize)>,
}

impl Query {
    pub(crate) fn new(engine: Arc<Engine>, columns: Columns) -> Self {
        Self {
            engine,
            columns,
            predicates: Vec::new(),
            order: Vec::new(),
            range: None,
        }
    }

    /// Applies one compiled predicate; `None` leaves the query unchanged.
    ///
    /// Separate calls narrow the result set together: OR happens only inside
    /// one compiled descriptor, AND between calls.
    pub fn filter(mut self, predicate: Option<Predicate>) -> Self {
        if let Some(predicate) = predicate {
            self.predicates.push(predicate);
        }
        self
    }

    /// Replaces the ordering
    pub fn order_by(mut self, order: Vec<OrderExpr>) -> Self {
        self.order = order;
        self
    }

    /// Restricts the fetch to rows `[start, end)` after ordering
    pub fn slice(mut self, start: usize, end: usize) -> Self {
        self.range = Some((start, end));
        self
    }

    /// The base tables this query touches: projection, filters and ordering
    pub fn tables(&self) -> BTreeSet<String> {
        let mut tables = self.columns.tables.clone();
        for predicate in &self.predicates {
            predicate.collect_tables(&mut tables);
        }
        for order in &self.order {
            order.expr.collect_tables(&mut tables);
        }
        tables
    }

    /// Counts matching rows.
    ///
    /// Ordering and slicing are irrelevant to a count and are ignored.
    pub fn count(&self) -> Result<u64, EngineError> {
        let now = Utc::now();
        let (tables, snapshots) = self.snapshots()?;
        let mut total = 0u64;
        self.scan(&tables, &snapshots, now, |_| total += 1);
        Ok(total)
    }

    /// Fetches matching rows: filter, order, slice, project.
    ///
    /// Each row is an object keyed by the projected column labels.
    pub fn all(&self) -> Result<Vec<Value>, EngineError> {
        let now = Utc::now();
        let (tables, snapshots) = self.snapshots()?;

        let mut contexts: Vec<HashMap<&str, &Value>> = Vec::new();
        self.scan(&tables, &snapshots, now, |ctx| contexts.push(ctx));

        if !self.order.is_empty() {
            contexts.sort_by(|a, b| {
                for order in &self.order {
                    let left = eval_column(&order.expr, a, now);
                    let right = eval_column(&order.expr, b, now);
                    let mut ordering = sort_compare(Some(&left), Some(&right));
                    if order.descending {
                        ordering = ordering.reverse();
                    }
                    if ordering != std::cmp::Ordering::Equal {
                        return ordering;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        let contexts: Vec<_> = match self.range {
            Some((start, end)) => contexts
                .into_iter()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect(),
            None => contexts,
        };

        let mut rows = Vec::with_capacity(contexts.len());
        for ctx in contexts {
            let mut row = Map::new();
            for (position, expr) in self.columns.exprs.iter().enumerate() {
                let label = match expr.name() {
                    Some(name) => name.to_string(),
                    None => format!("column_{}", position + 1),
                };
                row.insert(label, eval_column(expr, &ctx, now));
            }
            rows.push(Value::Object(row));
        }
        Ok(rows)
    }

    fn snapshots(&self) -> Result<(Vec<String>, Vec<Vec<Value>>), EngineError> {
        let tables: Vec<String> = self.tables().into_iter().collect();
        let mut snapshots = Vec::with_capacity(tables.len());
        for table in &tables {
            snapshots.push(self.engine.snapshot(table)?);
        }
        Ok((tables, snapshots))
    }

    /// Walks the cartesian product of the table snapshots, invoking the
    /// callback for every context matching all predicates.
    fn scan<'a, F>(
        &self,
        tables: &'a [String],
        snapshots: &'a [Vec<Value>],
        now: DateTime<Utc>,
        mut on_match: F,
    ) where
        F: FnMut(HashMap<&'a str, &'a Value>),
    {
        if tables.is_empty() || snapshots.iter().any(Vec::is_empty) {
            return;
        }

        let mut cursor = vec![0usize; tables.len()];
        loop {
            let mut ctx: HashMap<&str, &Value> = HashMap::with_capacity(tables.len());
            for (i, table) in tables.iter().enumerate() {
                ctx.insert(table.as_str(), &snapshots[i][cursor[i]]);
            }
            if self
                .predicates
                .iter()
                .all(|p| eval_predicate(p, &ctx, now))
            {
                on_match(ctx);
            }

            // Advance the odometer
            let mut position = tables.len();
            loop {
                if position == 0 {
                    return;
                }
                position -= 1;
                cursor[position] += 1;
                if cursor[position] < snapshots[position].len() {
                    break;
                }
                cursor[position] = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ColumnExpr;
    use crate::options::{Options, OrderSpec};
    use crate::registry::EngineOptions;
    use crate::schema::{ColumnDef, FieldType, TableDef};
    use serde_json::json;

    fn engine_with_users() -> Arc<Engine> {
        let engine = Engine::connect("mem://test", EngineOptions::default()).unwrap();
        engine.create_table(&TableDef::new("users"));
        for (id, name, age) in [(1, "ada", 36), (2, "grace", 85), (3, "alan", 41)] {
            engine
                .insert_row("users", json!({"id": id, "name": name, "age": age}))
                .unwrap();
        }
        engine
    }

    fn user_options() -> Options {
        let table = TableDef::new("users")
            .with_column(ColumnDef::new("id", FieldType::Int))
            .with_column(ColumnDef::new("name", FieldType::String))
            .with_column(ColumnDef::new("age", FieldType::Int));
        let mut options = Options::new();
        options.add_table(&table, &[], None);
        options
    }

    #[test]
    fn test_filter_none_is_noop() {
        let engine = engine_with_users();
        let query = Query::new(engine, user_options().get(&[])).filter(None);
        assert_eq!(query.count().unwrap(), 3);
    }

    #[test]
    fn test_sequential_filters_narrow() {
        let engine = engine_with_users();
        let query = Query::new(engine, user_options().get(&[]))
            .filter(Some(Predicate::Compare {
                column: ColumnExpr::column("users", "age"),
                op: crate::expr::CmpOp::Gt,
                value: crate::expr::Operand::Value(json!(40)),
            }))
            .filter(Some(Predicate::eq(
                ColumnExpr::column("users", "name"),
                json!("alan"),
            )));
        assert_eq!(query.count().unwrap(), 1);
    }

    #[test]
    fn test_ordering_and_projection() {
        let engine = engine_with_users();
        let options = user_options();
        let order = options
            .structure_order_by(&[OrderSpec::desc("age")])
            .unwrap();
        let rows = Query::new(engine, options.get(&["name"]))
            .order_by(order)
            .all()
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("grace"), json!("alan"), json!("ada")]);
        // Only the requested column is projected
        assert!(rows[0].get("age").is_none());
    }

    #[test]
    fn test_count_ignores_order_and_slice() {
        let engine = engine_with_users();
        let options = user_options();
        let order = options.structure_order_by(&[OrderSpec::asc("name")]).unwrap();
        let query = Query::new(engine, options.get(&[]))
            .order_by(order)
            .slice(0, 1);
        assert_eq!(query.count().unwrap(), 3);
        assert_eq!(query.all().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_table_propagates() {
        let engine = Engine::connect("mem://test", EngineOptions::default()).unwrap();
        let mut options = Options::new();
        options.add_column("x", ColumnExpr::column("ghosts", "x"));
        let query = Query::new(engine, options.get(&[]));
        assert!(matches!(
            query.count().unwrap_err(),
            EngineError::UnknownTable(_)
        ));
    }

    #[test]
    fn test_two_table_scan_is_cartesian() {
        let engine = engine_with_users();
        engine.create_table(&TableDef::new("roles"));
        engine
            .insert_row("roles", json!({"user_id": 1, "role": "admin"}))
            .unwrap();
        engine
            .insert_row("roles", json!({"user_id": 2, "role": "member"}))
            .unwrap();

        let mut options = Options::new();
        options.add_column("name", ColumnExpr::column("users", "name"));
        options.add_column("role", ColumnExpr::column("roles", "role"));

        // One matching user times every role row
        let filter = Predicate::eq(ColumnExpr::column("users", "id"), json!(1));
        let query = Query::new(engine, options.get(&[])).filter(Some(filter));
        assert_eq!(query.count().unwrap(), 2);
    }
}
