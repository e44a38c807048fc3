//! Storage engine
//!
//! One engine per logical database: in-memory table stores behind one lock,
//! created idempotently from schema metadata. The engine knows nothing about
//! filter descriptors; it stores rows and answers snapshots, and applies
//! already-compiled predicates for targeted updates and deletes.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde_json::{Map, Value};

use crate::executor::eval_predicate;
use crate::expr::Predicate;
use crate::observability::Logger;
use crate::schema::{IndexDef, TableDef};

use super::errors::{EngineError, EngineResult, RegistryError, RegistryResult};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Connection character encoding
    pub encoding: String,
    /// Storage variant applied as a deferred table option on MySQL urls
    pub variant: String,
    /// Trace every storage call
    pub debug: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            encoding: "utf8".to_string(),
            variant: "InnoDB".to_string(),
            debug: false,
        }
    }
}

#[derive(Debug, Default)]
struct TableStore {
    rows: Vec<Value>,
    indexes: BTreeSet<String>,
}

/// In-memory storage engine for one logical database
#[derive(Debug)]
pub struct Engine {
    url: String,
    options: EngineOptions,
    tables: RwLock<HashMap<String, TableStore>>,
}

impl Engine {
    /// Opens an engine for a connection url.
    ///
    /// The url must carry a scheme; a `mysql://` scheme marks the engine as
    /// needing deferred table options.
    pub fn connect(url: &str, options: EngineOptions) -> RegistryResult<Arc<Engine>> {
        if !url.contains("://") {
            return Err(RegistryError::InvalidUrl(url.to_string()));
        }
        let engine = Arc::new(Engine {
            url: url.to_string(),
            options,
            tables: RwLock::new(HashMap::new()),
        });
        if engine.options.debug {
            Logger::trace("ENGINE_CONNECT", &[("url", &engine.url)]);
        }
        Ok(engine)
    }

    /// Connection url, including any appended charset
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Engine configuration
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether the url names a MySQL database
    pub fn is_mysql(&self) -> bool {
        self.url.to_lowercase().starts_with("mysql://")
    }

    /// Creates the table store if missing; repeated calls are no-ops
    pub fn create_table(&self, def: &TableDef) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if !tables.contains_key(&def.name) {
            if self.options.debug {
                Logger::trace("CREATE_TABLE", &[("table", &def.name)]);
            }
            tables.insert(def.name.clone(), TableStore::default());
        }
    }

    /// Creates an index on an existing table.
    ///
    /// Errors with `IndexAlreadyExists` on repeat creation so the caller can
    /// decide whether that is a conflict or expected.
    pub fn create_index(&self, table: &str, index: &IndexDef) -> EngineResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let store = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))?;
        if !store.indexes.insert(index.name.clone()) {
            return Err(EngineError::IndexAlreadyExists {
                table: table.to_string(),
                index: index.name.clone(),
            });
        }
        Ok(())
    }

    /// Whether a table store exists
    pub fn has_table(&self, table: &str) -> bool {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(table)
    }

    /// Index names created on a table
    pub fn indexes(&self, table: &str) -> EngineResult<BTreeSet<String>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .get(table)
            .map(|store| store.indexes.clone())
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))
    }

    /// Appends a row to a table
    pub fn insert_row(&self, table: &str, row: Value) -> EngineResult<()> {
        if !row.is_object() {
            return Err(EngineError::InvalidRow(table.to_string()));
        }
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let store = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))?;
        store.rows.push(row);
        Ok(())
    }

    /// Clones the current rows of a table
    pub fn snapshot(&self, table: &str) -> EngineResult<Vec<Value>> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables
            .get(table)
            .map(|store| store.rows.clone())
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))
    }

    /// Merges values into every row matching the predicate.
    ///
    /// `None` matches every row. Returns the number of updated rows.
    pub fn update_rows(
        &self,
        table: &str,
        predicate: Option<&Predicate>,
        values: &Map<String, Value>,
    ) -> EngineResult<u64> {
        let now = Utc::now();
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let store = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))?;

        let mut updated = 0;
        for row in store.rows.iter_mut() {
            let matches = match predicate {
                Some(predicate) => {
                    let mut ctx = HashMap::new();
                    ctx.insert(table, &*row);
                    eval_predicate(predicate, &ctx, now)
                }
                None => true,
            };
            if !matches {
                continue;
            }
            if let Some(object) = row.as_object_mut() {
                for (key, value) in values {
                    object.insert(key.clone(), value.clone());
                }
                updated += 1;
            }
        }
        Ok(updated)
    }

    /// Removes every row matching the predicate.
    ///
    /// `None` matches every row. Returns the number of removed rows.
    pub fn delete_rows(&self, table: &str, predicate: Option<&Predicate>) -> EngineResult<u64> {
        let now = Utc::now();
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        let store = tables
            .get_mut(table)
            .ok_or_else(|| EngineError::UnknownTable(table.to_string()))?;

        let before = store.rows.len();
        store.rows.retain(|row| match predicate {
            Some(predicate) => {
                let mut ctx = HashMap::new();
                ctx.insert(table, row);
                !eval_predicate(predicate, &ctx, now)
            }
            None => false,
        });
        Ok((before - store.rows.len()) as u64)
    }
}
