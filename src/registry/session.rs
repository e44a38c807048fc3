//! Sessions and session factories
//!
//! A factory is bound to one engine and its schema metadata; sessions are
//! cheap handles the caller creates per request or per transaction. Writes
//! go through the session so column defaults and type checks apply; reads
//! start from `query`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::executor::Query;
use crate::expr::Predicate;
use crate::options::Columns;
use crate::schema::{SchemaMetadata, TableDef};

use super::engine::Engine;
use super::errors::{EngineError, EngineResult};

/// Observer invoked for every session a factory creates
pub type SessionHook = Arc<dyn Fn(&Session) + Send + Sync>;

/// Creates sessions bound to one engine
pub struct SessionFactory {
    engine: Arc<Engine>,
    metadata: Arc<SchemaMetadata>,
    hook: Option<SessionHook>,
}

impl std::fmt::Debug for SessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionFactory")
            .field("hook", &self.hook.as_ref().map(|_| "<hook>"))
            .finish_non_exhaustive()
    }
}

impl SessionFactory {
    pub(crate) fn new(
        engine: Arc<Engine>,
        metadata: Arc<SchemaMetadata>,
        hook: Option<SessionHook>,
    ) -> Self {
        Self {
            engine,
            metadata,
            hook,
        }
    }

    /// The engine this factory binds to
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Opens a session
    pub fn session(&self) -> Session {
        let session = Session {
            engine: Arc::clone(&self.engine),
            metadata: Arc::clone(&self.metadata),
        };
        if let Some(hook) = &self.hook {
            hook(&session);
        }
        session
    }
}

/// A handle for querying and writing one logical database
pub struct Session {
    engine: Arc<Engine>,
    metadata: Arc<SchemaMetadata>,
}

impl Session {
    /// Starts a query over a resolved projection
    pub fn query(&self, columns: Columns) -> Query {
        Query::new(Arc::clone(&self.engine), columns)
    }

    /// Schema metadata for this session's database
    pub fn metadata(&self) -> &Arc<SchemaMetadata> {
        &self.metadata
    }

    /// Inserts a row, applying insert defaults and validating declared
    /// columns. Returns the stored row.
    pub fn insert(&self, table: &str, row: Value) -> EngineResult<Value> {
        let def = self.table_def(table)?;
        let mut object = match row {
            Value::Object(object) => object,
            _ => return Err(EngineError::InvalidRow(table.to_string())),
        };

        for column in &def.columns {
            let missing = object
                .get(&column.name)
                .map(Value::is_null)
                .unwrap_or(true);
            if missing {
                if let Some(default) = &column.default {
                    object.insert(column.name.clone(), default.generate());
                }
            }
        }
        Self::validate(&def, &object, true)?;

        let stored = Value::Object(object);
        self.engine.insert_row(table, stored.clone())?;
        Ok(stored)
    }

    /// Updates rows matching the predicate, applying on-update defaults for
    /// columns the values leave out. Returns the number of updated rows.
    pub fn update(
        &self,
        table: &str,
        predicate: Option<&Predicate>,
        values: Map<String, Value>,
    ) -> EngineResult<u64> {
        let def = self.table_def(table)?;
        let mut values = values;
        for column in &def.columns {
            if !values.contains_key(&column.name) {
                if let Some(on_update) = &column.on_update {
                    values.insert(column.name.clone(), on_update.generate());
                }
            }
        }
        Self::validate(&def, &values, false)?;
        self.engine.update_rows(table, predicate, &values)
    }

    /// Deletes rows matching the predicate; `None` deletes every row.
    /// Returns the number of deleted rows.
    pub fn delete(&self, table: &str, predicate: Option<&Predicate>) -> EngineResult<u64> {
        self.engine.delete_rows(table, predicate)
    }

    fn table_def(&self, table: &str) -> EngineResult<Arc<TableDef>> {
        self.metadata
            .table(table)
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))
    }

    /// Checks values against the declared columns.
    ///
    /// Unknown keys are rejected rather than silently stored. Nullability is
    /// only enforced for a full row, not a partial update.
    fn validate(def: &TableDef, values: &Map<String, Value>, full_row: bool) -> EngineResult<()> {
        for (key, value) in values {
            let column = def.column_def(key).ok_or_else(|| EngineError::UnknownColumn {
                table: def.name.clone(),
                column: key.clone(),
            })?;
            if !value.is_null() && !column.field_type.accepts(value) {
                return Err(EngineError::TypeMismatch {
                    table: def.name.clone(),
                    column: key.clone(),
                    expected: column.field_type.type_name(),
                });
            }
        }
        if full_row {
            for column in &def.columns {
                let missing = values
                    .get(&column.name)
                    .map(Value::is_null)
                    .unwrap_or(true);
                if missing && !column.nullable {
                    return Err(EngineError::NotNullable {
                        table: def.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
