//! Table, column and index definitions

use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::expr::{parse_instant, ColumnExpr};

/// Supported column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// Boolean
    Bool,
    /// 64-bit floating point
    Float,
    /// Date or datetime, stored as an RFC 3339 string
    Date,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Date => "date",
        }
    }

    /// Whether a non-null row value fits this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Int => value.as_i64().is_some() || value.as_u64().is_some(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Float => value.is_number(),
            FieldType::Date => value.as_str().is_some_and(|s| parse_instant(s).is_some()),
        }
    }
}

/// Generated default for an absent column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnDefault {
    /// Random v4 UUID string
    Uuid,
    /// Current timestamp as RFC 3339
    Now,
    /// Constant value
    Value(Value),
}

impl ColumnDefault {
    /// Produces the default value
    pub fn generate(&self) -> Value {
        match self {
            ColumnDefault::Uuid => Value::String(Uuid::new_v4().to_string()),
            ColumnDefault::Now => Value::String(Utc::now().to_rfc3339()),
            ColumnDefault::Value(value) => value.clone(),
        }
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column type
    pub field_type: FieldType,
    /// Whether null values are allowed
    pub nullable: bool,
    /// Generated when the column is absent on insert
    pub default: Option<ColumnDefault>,
    /// Generated when the column is absent on update
    pub on_update: Option<ColumnDefault>,
}

impl ColumnDef {
    /// Non-nullable column of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            default: None,
            on_update: None,
        }
    }

    /// Marks the column nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Sets the insert default
    pub fn with_default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the update default
    pub fn with_on_update(mut self, on_update: ColumnDefault) -> Self {
        self.on_update = Some(on_update);
        self
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name, unique per table
    pub name: String,
    /// Covered column names
    pub columns: Vec<String>,
}

impl IndexDef {
    /// Index over the given columns
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// Table definition
///
/// Shape is fixed at declaration time; only the storage options map may gain
/// entries later, when an engine applies its deferred defaults.
#[derive(Debug)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    /// Declared indexes
    pub indexes: Vec<IndexDef>,
    /// Alternate names this table resolves under
    pub aliases: Vec<String>,
    /// Storage options (engine variant, charset)
    options: RwLock<BTreeMap<String, String>>,
}

impl TableDef {
    /// Empty table definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            aliases: Vec::new(),
            options: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a column
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Adds an index
    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds an alias name
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Looks up a column definition by name
    pub fn column_def(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column expression for a column of this table.
    ///
    /// Unchecked: temporal filters reference `start_date`/`end_date` columns
    /// by convention, declared or not.
    pub fn col(&self, name: impl Into<String>) -> ColumnExpr {
        ColumnExpr::column(self.name.clone(), name)
    }

    /// Sets a storage option unless already set
    pub fn set_option_default(&self, key: &str, value: &str) {
        let mut options = self.options.write().unwrap_or_else(|e| e.into_inner());
        options.entry(key.to_string()).or_insert_with(|| value.to_string());
    }

    /// Snapshot of the storage options
    pub fn storage_options(&self) -> BTreeMap<String, String> {
        self.options
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
