//! Schema metadata and table bases
//!
//! `SchemaMetadata` is the set of declared tables for one logical database;
//! registration is monotonic and idempotent by table name. A `TableBase` is
//! a declaration scope attached to the metadata: several bases may exist for
//! one database to separate concerns, and name resolution walks all of them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::table::TableDef;

/// Declared tables for one logical database
#[derive(Debug)]
pub struct SchemaMetadata {
    name: String,
    tables: RwLock<Vec<Arc<TableDef>>>,
}

impl SchemaMetadata {
    /// Empty metadata for a logical database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: RwLock::new(Vec::new()),
        }
    }

    /// Logical database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a table definition.
    ///
    /// Idempotent by table name: a repeated declaration returns the handle
    /// registered first, never a replacement.
    pub fn declare_table(&self, def: TableDef) -> Arc<TableDef> {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = tables.iter().find(|t| t.name == def.name) {
            return Arc::clone(existing);
        }
        let def = Arc::new(def);
        tables.push(Arc::clone(&def));
        def
    }

    /// Looks up a declared table by primary name
    pub fn table(&self, name: &str) -> Option<Arc<TableDef>> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    /// Declared tables ordered by name
    pub fn sorted_tables(&self) -> Vec<Arc<TableDef>> {
        let mut tables = self
            .tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Applies deferred storage defaults to every declared table.
    ///
    /// Options already set on a table are left alone.
    pub fn apply_storage_defaults(&self, variant: &str, charset: &str) {
        for table in self.sorted_tables() {
            table.set_option_default("engine", variant);
            table.set_option_default("charset", charset);
        }
    }
}

/// A declaration scope table definitions attach to
#[derive(Debug)]
pub struct TableBase {
    metadata: Arc<SchemaMetadata>,
    tables: RwLock<Vec<Arc<TableDef>>>,
}

impl TableBase {
    pub(crate) fn new(metadata: Arc<SchemaMetadata>) -> Self {
        Self {
            metadata,
            tables: RwLock::new(Vec::new()),
        }
    }

    /// The metadata this base registers into
    pub fn metadata(&self) -> &Arc<SchemaMetadata> {
        &self.metadata
    }

    /// Declares a table on this base and in the shared metadata
    pub fn declare(&self, def: TableDef) -> Arc<TableDef> {
        let def = self.metadata.declare_table(def);
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        if !tables.iter().any(|t| Arc::ptr_eq(t, &def)) {
            tables.push(Arc::clone(&def));
        }
        def
    }

    /// Tables declared through this base, in declaration order
    pub fn tables(&self) -> Vec<Arc<TableDef>> {
        self.tables.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Adds this base's tables to a name-resolution map.
    ///
    /// Primary names never overwrite an earlier registration; alias names do.
    pub(crate) fn resolve_into(&self, references: &mut HashMap<String, Arc<TableDef>>) {
        for table in self.tables().iter() {
            references
                .entry(table.name.clone())
                .or_insert_with(|| Arc::clone(table));
            for alias in &table.aliases {
                references.insert(alias.clone(), Arc::clone(table));
            }
        }
    }
}
