//! Registry lifecycle, exercised end to end: declare, initialize, write
//! through a session, read back through a query.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use sievedb::options::Options;
use sievedb::registry::{DatabaseRegistry, InitializeOptions, RegistryError, SessionHook};
use sievedb::schema::{ColumnDef, ColumnDefault, FieldType, IndexDef, TableDef};

fn accounts_table() -> TableDef {
    TableDef::new("accounts")
        .with_column(ColumnDef::new("id", FieldType::String).with_default(ColumnDefault::Uuid))
        .with_column(ColumnDef::new("email", FieldType::String))
        .with_column(ColumnDef::new("credits", FieldType::Int).nullable())
        .with_index(IndexDef::new("accounts_email_idx", vec!["email".to_string()]))
}

#[test]
fn declare_initialize_write_read() {
    let registry = DatabaseRegistry::new();
    let metadata = registry.declare_schema("billing");
    let accounts = metadata.declare_table(accounts_table());

    registry
        .initialize("billing", "mem://billing", InitializeOptions::default())
        .unwrap();

    let session = registry.session_factory("billing").unwrap().session();
    let stored = session
        .insert("accounts", json!({"email": "ada@example.com", "credits": 10}))
        .unwrap();
    assert!(stored["id"].is_string());

    let mut options = Options::new();
    options.add_table(&accounts, &["id"], None);
    let rows = session.query(options.get(&[])).all().unwrap();
    assert_eq!(rows, vec![json!({"email": "ada@example.com", "credits": 10})]);
}

#[test]
fn logical_databases_are_isolated() {
    let registry = DatabaseRegistry::new();
    for name in ["tenant_a", "tenant_b"] {
        registry.declare_schema(name).declare_table(accounts_table());
        registry
            .initialize(name, &format!("mem://{name}"), InitializeOptions::default())
            .unwrap();
    }

    let session_a = registry.session_factory("tenant_a").unwrap().session();
    session_a
        .insert("accounts", json!({"email": "a@example.com"}))
        .unwrap();

    let session_b = registry.session_factory("tenant_b").unwrap().session();
    let mut options = Options::new();
    options.add_table(&session_b.metadata().table("accounts").unwrap(), &[], None);
    assert!(session_b.query(options.get(&[])).all().unwrap().is_empty());
}

#[test]
fn reinitialize_rebinds_engine_and_recreates_schema() {
    let registry = DatabaseRegistry::new();
    registry.declare_schema("billing").declare_table(accounts_table());
    registry
        .initialize("billing", "mem://billing", InitializeOptions::default())
        .unwrap();

    let engine_before = registry.engine("billing").unwrap();

    // Rebinding connects a fresh engine; declared tables and indexes come
    // back without erroring on the ones that already exist
    registry
        .initialize("billing", "mem://billing", InitializeOptions::default())
        .unwrap();
    let engine_after = registry.engine("billing").unwrap();
    assert!(!Arc::ptr_eq(&engine_before, &engine_after));
    assert!(engine_after.has_table("accounts"));

    let indexed = registry.indexed_columns("billing").unwrap();
    assert!(indexed["accounts"].contains("email"));
}

#[test]
fn session_hook_observes_every_session() {
    let registry = DatabaseRegistry::new();
    registry.declare_schema("billing").declare_table(accounts_table());

    let opened = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&opened);
    let hook: SessionHook = Arc::new(move |_session| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let factory = registry
        .initialize(
            "billing",
            "mem://billing",
            InitializeOptions {
                session_hook: Some(hook),
                ..Default::default()
            },
        )
        .unwrap();

    factory.session();
    factory.session();
    assert_eq!(opened.load(Ordering::SeqCst), 2);
}

#[test]
fn table_base_aliases_resolve_across_bases() {
    let registry = DatabaseRegistry::new();
    let core = registry.declare_table_base("billing");
    let extensions = registry.declare_table_base("billing");
    core.declare(accounts_table());
    extensions.declare(TableDef::new("ledger").with_alias("journal"));

    let tables = registry.lookup_tables("billing").unwrap();
    assert_eq!(tables["accounts"].name, "accounts");
    assert_eq!(tables["journal"].name, "ledger");
}

#[test]
fn unregistered_names_error() {
    let registry = DatabaseRegistry::new();
    assert_eq!(
        registry.lookup_tables("ghost").unwrap_err(),
        RegistryError::NotRegistered("ghost".to_string())
    );
    assert!(registry.engine("ghost").is_err());
    assert!(registry.session_factory("ghost").is_err());
    assert!(registry.indexed_columns("ghost").is_err());
}
