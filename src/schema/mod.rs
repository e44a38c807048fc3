//! Schema definitions
//!
//! Table, column and index definitions, the per-database schema metadata
//! they register into, and the table bases definitions attach to. Schema is
//! declared during a bounded startup phase and read-only afterwards, except
//! for monotonic table registration.

mod metadata;
mod table;

pub use metadata::{SchemaMetadata, TableBase};
pub use table::{ColumnDef, ColumnDefault, FieldType, IndexDef, TableDef};
