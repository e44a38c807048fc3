//! Database registry
//!
//! A process-wide map from logical-database name to schema metadata, engine,
//! session factory, table bases and index coverage. The registry is an
//! explicit service object injected into whatever needs it, never ambient
//! global state.
//!
//! # Invariants
//!
//! - Declaration is monotonic: re-initialization rebinds engine and sessions
//!   but never discards declared table definitions
//! - Entries publish atomically: a concurrent reader sees a complete entry
//!   or none
//! - The registry serializes map mutation only; concurrent first-time
//!   initialization for one name is the caller's startup lock to take

mod engine;
mod errors;
mod session;

pub use engine::{Engine, EngineOptions};
pub use errors::{EngineError, EngineResult, RegistryError, RegistryResult};
pub use session::{Session, SessionFactory, SessionHook};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use crate::observability::Logger;
use crate::schema::{SchemaMetadata, TableBase, TableDef};

/// Options for `initialize`
#[derive(Clone, Default)]
pub struct InitializeOptions {
    /// Connection character encoding, appended to the url as a charset
    pub encoding: Option<String>,
    /// Storage variant for MySQL tables
    pub variant: Option<String>,
    /// Observer invoked for every session the factory creates
    pub session_hook: Option<SessionHook>,
    /// Trace storage calls
    pub debug: bool,
}

#[derive(Default)]
struct DatabaseEntry {
    metadata: Option<Arc<SchemaMetadata>>,
    bases: Vec<Arc<TableBase>>,
    engine: Option<Arc<Engine>>,
    sessions: Option<Arc<SessionFactory>>,
    indexed_columns: HashMap<String, BTreeSet<String>>,
}

/// Registry of logical databases
#[derive(Default)]
pub struct DatabaseRegistry {
    entries: RwLock<HashMap<String, DatabaseEntry>>,
}

impl DatabaseRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema metadata for a logical database, creating and
    /// registering empty metadata on first call. Monotonic: repeated calls
    /// return the same underlying handle.
    pub fn declare_schema(&self, name: &str) -> Arc<SchemaMetadata> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(name.to_string()).or_default();
        entry
            .metadata
            .get_or_insert_with(|| Arc::new(SchemaMetadata::new(name)))
            .clone()
    }

    /// Creates a new table base scoped to a logical database.
    ///
    /// Multiple bases may be declared per name to separate concerns; all of
    /// them are walked by `lookup_tables`.
    pub fn declare_table_base(&self, name: &str) -> Arc<TableBase> {
        let metadata = self.declare_schema(name);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(name.to_string()).or_default();
        let base = Arc::new(TableBase::new(metadata));
        entry.bases.push(Arc::clone(&base));
        base
    }

    /// Resolves every table name and alias declared under a logical database.
    ///
    /// Bases are walked in declaration order: a primary name keeps its first
    /// registration; an alias may override a name declared earlier.
    pub fn lookup_tables(&self, name: &str) -> RegistryResult<HashMap<String, Arc<TableDef>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        let mut references = HashMap::new();
        for base in &entry.bases {
            base.resolve_into(&mut references);
        }
        Ok(references)
    }

    /// Binds (or rebinds) the engine and session factory for a logical
    /// database, creating missing tables and indexes against the new engine.
    ///
    /// Index creation conflicts from earlier initializations are expected
    /// and swallowed. Any other DDL failure aborts initialization.
    pub fn initialize(
        &self,
        name: &str,
        url: &str,
        options: InitializeOptions,
    ) -> RegistryResult<Arc<SessionFactory>> {
        let encoding = options.encoding.unwrap_or_else(|| "utf8".to_string());
        let variant = options.variant.unwrap_or_else(|| "InnoDB".to_string());
        let url = format!("{url}?charset={encoding}");

        let metadata = self.declare_schema(name);
        let engine = Engine::connect(
            &url,
            EngineOptions {
                encoding: encoding.clone(),
                variant: variant.clone(),
                debug: options.debug,
            },
        )?;

        // MySQL table options only apply once the url is known
        if engine.is_mysql() {
            metadata.apply_storage_defaults(&variant, &encoding);
        }

        let mut indexed_columns: HashMap<String, BTreeSet<String>> = HashMap::new();
        for table in metadata.sorted_tables() {
            engine.create_table(&table);
            for index in &table.indexes {
                indexed_columns
                    .entry(table.name.clone())
                    .or_default()
                    .extend(index.columns.iter().cloned());
                match engine.create_index(&table.name, index) {
                    Ok(()) => {}
                    Err(EngineError::IndexAlreadyExists { .. }) => {
                        Logger::info(
                            "INDEX_EXISTS",
                            &[("table", table.name.as_str()), ("index", index.name.as_str())],
                        );
                    }
                    Err(other) => return Err(other.into()),
                }
            }
        }

        let sessions = Arc::new(SessionFactory::new(
            Arc::clone(&engine),
            Arc::clone(&metadata),
            options.session_hook,
        ));

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let entry = entries.entry(name.to_string()).or_default();
        entry.metadata.get_or_insert_with(|| Arc::clone(&metadata));
        entry.engine = Some(engine);
        entry.sessions = Some(Arc::clone(&sessions));
        entry.indexed_columns = indexed_columns;
        Ok(sessions)
    }

    /// The engine bound to a logical database, if initialized
    pub fn engine(&self, name: &str) -> RegistryResult<Arc<Engine>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(name)
            .and_then(|entry| entry.engine.clone())
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// The session factory bound to a logical database, if initialized
    pub fn session_factory(&self, name: &str) -> RegistryResult<Arc<SessionFactory>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(name)
            .and_then(|entry| entry.sessions.clone())
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Per-table column names covered by at least one index
    pub fn indexed_columns(
        &self,
        name: &str,
    ) -> RegistryResult<HashMap<String, BTreeSet<String>>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(name)
            .map(|entry| entry.indexed_columns.clone())
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, FieldType, IndexDef};

    #[test]
    fn test_declare_schema_returns_same_handle() {
        let registry = DatabaseRegistry::new();
        let first = registry.declare_schema("app_a");
        let second = registry.declare_schema("app_a");
        assert!(Arc::ptr_eq(&first, &second));

        // A table declared through one handle is visible through the other
        first.declare_table(TableDef::new("users"));
        assert!(second.table("users").is_some());
    }

    #[test]
    fn test_lookup_tables_requires_declaration() {
        let registry = DatabaseRegistry::new();
        let err = registry.lookup_tables("ghost").unwrap_err();
        assert_eq!(err, RegistryError::NotRegistered("ghost".to_string()));
    }

    #[test]
    fn test_lookup_tables_walks_bases() {
        let registry = DatabaseRegistry::new();
        let base_a = registry.declare_table_base("app");
        let base_b = registry.declare_table_base("app");
        base_a.declare(TableDef::new("users"));
        base_b.declare(TableDef::new("orders").with_alias("purchases"));

        let tables = registry.lookup_tables("app").unwrap();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables["purchases"].name, "orders");
    }

    #[test]
    fn test_initialize_is_idempotent_for_metadata() {
        let registry = DatabaseRegistry::new();
        let metadata = registry.declare_schema("app");
        metadata.declare_table(
            TableDef::new("users")
                .with_column(ColumnDef::new("id", FieldType::String))
                .with_index(IndexDef::new("users_id_idx", vec!["id".to_string()])),
        );

        registry
            .initialize("app", "mem://app", InitializeOptions::default())
            .unwrap();
        // Rebinding must keep the declared tables and tolerate index DDL
        registry
            .initialize("app", "mem://app", InitializeOptions::default())
            .unwrap();

        assert!(registry.declare_schema("app").table("users").is_some());
        let indexed = registry.indexed_columns("app").unwrap();
        assert!(indexed["users"].contains("id"));
    }

    #[test]
    fn test_initialize_appends_charset() {
        let registry = DatabaseRegistry::new();
        registry.declare_schema("app");
        registry
            .initialize(
                "app",
                "mem://app",
                InitializeOptions {
                    encoding: Some("latin1".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(registry.engine("app").unwrap().url(), "mem://app?charset=latin1");
    }

    #[test]
    fn test_mysql_tables_get_storage_defaults() {
        let registry = DatabaseRegistry::new();
        let metadata = registry.declare_schema("app");
        let users = metadata.declare_table(TableDef::new("users"));
        registry
            .initialize("app", "mysql://host/app", InitializeOptions::default())
            .unwrap();
        let options = users.storage_options();
        assert_eq!(options.get("engine"), Some(&"InnoDB".to_string()));
        assert_eq!(options.get("charset"), Some(&"utf8".to_string()));
    }

    #[test]
    fn test_initialize_rejects_bad_url() {
        let registry = DatabaseRegistry::new();
        let err = registry
            .initialize("app", "nonsense", InitializeOptions::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl(_)));
    }

    #[test]
    fn test_accessors_before_initialize() {
        let registry = DatabaseRegistry::new();
        registry.declare_schema("app");
        assert!(registry.engine("app").is_err());
        assert!(registry.session_factory("app").is_err());
    }
}
