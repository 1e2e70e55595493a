//! Declarative metadata: column types, field references and the record contract.

mod field;
mod table;

pub(crate) use field::PgQuery;
pub use field::{FieldModifier, FieldType, FieldValue, SchemaFieldReference};
pub use table::{record_setters, FieldDescriptor, MappedValues, TableSchema};
