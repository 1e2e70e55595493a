//! The contract every persisted record type implements.

use crate::error::MappingError;
use crate::schema::{FieldType, FieldValue, SchemaFieldReference};
use crate::sql::ColumnSetter;
use chrono::{DateTime, Utc};

/// One column of a record type: its reference plus the accessor that reads it.
pub struct FieldDescriptor<T> {
    pub reference: SchemaFieldReference,
    pub get: fn(&T) -> FieldValue,
}

/// Implemented by record types the engine can create, write and read.
///
/// `descriptors()` is a static, ordered table; statement columns and bind order
/// follow it. Each accessor must return a value matching its reference's type.
pub trait TableSchema: Sized + Send + Sync + 'static {
    fn table_name() -> &'static str;

    fn descriptors() -> &'static [FieldDescriptor<Self>];

    /// Rebuild a record from mapped column values.
    fn from_values(values: MappedValues) -> Result<Self, MappingError>;

    fn fields() -> Vec<&'static SchemaFieldReference> {
        Self::descriptors().iter().map(|d| &d.reference).collect()
    }

    fn primary_key() -> Option<&'static SchemaFieldReference> {
        Self::descriptors()
            .iter()
            .map(|d| &d.reference)
            .find(|r| r.is_primary_key())
    }

    fn field(name: &str) -> Option<&'static SchemaFieldReference> {
        Self::descriptors()
            .iter()
            .map(|d| &d.reference)
            .find(|r| r.name().eq_ignore_ascii_case(name))
    }
}

/// Setters for a record's columns in declaration order. Server-generated
/// columns without a value are left out so the database default applies.
pub fn record_setters<T: TableSchema>(record: &T, include_primary_key: bool) -> Vec<ColumnSetter> {
    T::descriptors()
        .iter()
        .filter(|d| include_primary_key || !d.reference.is_primary_key())
        .filter_map(|d| {
            let value = (d.get)(record);
            if value.is_null() && d.reference.is_server_generated() {
                None
            } else {
                Some(ColumnSetter::typed(
                    d.reference.name(),
                    d.reference.field_type(),
                    value,
                ))
            }
        })
        .collect()
}

/// Column values matched to a record's fields, consumed by `from_values`.
#[derive(Debug, Default)]
pub struct MappedValues {
    values: Vec<(String, FieldValue)>,
}

impl MappedValues {
    pub(crate) fn push(&mut self, field: &str, value: FieldValue) {
        self.values.push((field.to_string(), value));
    }

    /// Remove the value for `field`; `Null` when the row did not carry it.
    pub fn take(&mut self, field: &str) -> FieldValue {
        match self
            .values
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(field))
        {
            Some(i) => self.values.swap_remove(i).1,
            None => FieldValue::Null,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn optional<V>(
        &mut self,
        field: &str,
        expected: FieldType,
        extract: fn(FieldValue) -> Option<V>,
    ) -> Result<Option<V>, MappingError> {
        match self.take(field) {
            FieldValue::Null => Ok(None),
            value => {
                let actual = value.kind();
                extract(value).map(Some).ok_or(MappingError::TypeMismatch {
                    column: field.to_string(),
                    expected,
                    actual,
                })
            }
        }
    }

    fn required<V>(
        &mut self,
        field: &str,
        expected: FieldType,
        extract: fn(FieldValue) -> Option<V>,
    ) -> Result<V, MappingError> {
        self.optional(field, expected, extract)?
            .ok_or_else(|| MappingError::MissingField { field: field.to_string() })
    }

    pub fn string(&mut self, field: &str) -> Result<String, MappingError> {
        self.required(field, FieldType::String, into_string)
    }

    pub fn opt_string(&mut self, field: &str) -> Result<Option<String>, MappingError> {
        self.optional(field, FieldType::String, into_string)
    }

    pub fn integer(&mut self, field: &str) -> Result<i32, MappingError> {
        self.required(field, FieldType::Integer, |v| v.as_i32())
    }

    pub fn opt_integer(&mut self, field: &str) -> Result<Option<i32>, MappingError> {
        self.optional(field, FieldType::Integer, |v| v.as_i32())
    }

    pub fn double(&mut self, field: &str) -> Result<f64, MappingError> {
        self.required(field, FieldType::Double, |v| v.as_f64())
    }

    pub fn boolean(&mut self, field: &str) -> Result<bool, MappingError> {
        self.required(field, FieldType::Boolean, |v| v.as_bool())
    }

    pub fn timestamp(&mut self, field: &str) -> Result<DateTime<Utc>, MappingError> {
        self.required(field, FieldType::Timestamp, |v| v.as_timestamp())
    }

    pub fn opt_timestamp(&mut self, field: &str) -> Result<Option<DateTime<Utc>>, MappingError> {
        self.optional(field, FieldType::Timestamp, |v| v.as_timestamp())
    }

    /// A NULL array maps to an empty list.
    pub fn string_array(&mut self, field: &str) -> Result<Vec<String>, MappingError> {
        Ok(self
            .optional(field, FieldType::StringArray, into_string_array)?
            .unwrap_or_default())
    }
}

fn into_string(v: FieldValue) -> Option<String> {
    match v {
        FieldValue::String(s) => Some(s),
        _ => None,
    }
}

fn into_string_array(v: FieldValue) -> Option<Vec<String>> {
    match v {
        FieldValue::StringArray(a) => Some(a),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_is_case_insensitive_and_consumes() {
        let mut values = MappedValues::default();
        values.push("createdAt", FieldValue::Integer(1));
        assert_eq!(values.take("createdat"), FieldValue::Integer(1));
        assert_eq!(values.take("createdat"), FieldValue::Null);
    }

    #[test]
    fn required_field_reports_missing() {
        let mut values = MappedValues::default();
        values.push("name", FieldValue::Null);
        assert!(matches!(
            values.string("name"),
            Err(MappingError::MissingField { .. })
        ));
        assert_eq!(values.opt_string("other").unwrap(), None);
    }

    #[test]
    fn wrong_variant_is_a_type_mismatch() {
        let mut values = MappedValues::default();
        values.push("id", FieldValue::from("3"));
        assert!(matches!(
            values.integer("id"),
            Err(MappingError::TypeMismatch { expected: FieldType::Integer, .. })
        ));
    }
}
