//! Result rows back into values and typed records.
//!
//! Columns are matched to field references by case-insensitive name, not by
//! position. A column with no matching field is an error.

use crate::error::MappingError;
use crate::schema::{FieldType, FieldValue, MappedValues, TableSchema};
use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row as _, TypeInfo};

/// Ordered column-name → value mapping of one result row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, FieldValue)>) -> Self {
        Row { columns }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.columns.iter().map(|(name, v)| (name.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, FieldValue)> {
        self.columns
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Map a row without a target schema; each column's type comes from the type
/// PostgreSQL reports for it.
pub fn row_to_record(row: &PgRow) -> Result<Row, MappingError> {
    let mut columns = Vec::with_capacity(row.columns().len());
    for (i, col) in row.columns().iter().enumerate() {
        let name = col.name();
        let pg_type = col.type_info().name();
        let ty = FieldType::from_pg_type(pg_type).ok_or_else(|| MappingError::UnsupportedColumnType {
            column: name.to_string(),
            pg_type: pg_type.to_string(),
        })?;
        let value = ty.decode(row, i).map_err(|source| MappingError::Decode {
            column: name.to_string(),
            source,
        })?;
        columns.push((name.to_string(), value));
    }
    Ok(Row { columns })
}

/// Map a result row into `T`, decoding each column as its field's declared type.
pub fn map_row<T: TableSchema>(row: &PgRow) -> Result<T, MappingError> {
    let mut values = MappedValues::default();
    for (i, col) in row.columns().iter().enumerate() {
        let field = field_for::<T>(col.name())?;
        let value = field
            .field_type()
            .decode(row, i)
            .map_err(|source| MappingError::Decode {
                column: col.name().to_string(),
                source,
            })?;
        values.push(field.name(), value);
    }
    T::from_values(values)
}

/// Map an already-decoded row into `T`; each value must fit its field's type.
pub fn map_record<T: TableSchema>(row: Row) -> Result<T, MappingError> {
    let mut values = MappedValues::default();
    for (column, value) in row.columns {
        let field = field_for::<T>(&column)?;
        if !value.matches(field.field_type()) {
            return Err(MappingError::TypeMismatch {
                column,
                expected: field.field_type(),
                actual: value.kind(),
            });
        }
        values.push(field.name(), value);
    }
    T::from_values(values)
}

fn field_for<T: TableSchema>(column: &str) -> Result<&'static crate::schema::SchemaFieldReference, MappingError> {
    T::field(column).ok_or_else(|| MappingError::UnknownColumn {
        table: T::table_name().to_string(),
        column: column.to_string(),
    })
}
