//! Column types, modifiers, values and field references.
//!
//! `FieldType` is the only place that knows how a value of each type is bound
//! into a statement and read back out of a result row.

use crate::error::SchemaError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{Column, Row, TypeInfo};
use std::borrow::Cow;
use std::fmt;

pub(crate) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Closed set of column types the engine can generate, bind and map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    LongString,
    Integer,
    Double,
    Boolean,
    /// An instant; stored as `TIMESTAMPTZ`.
    Timestamp,
    StringArray,
}

impl FieldType {
    /// Native PostgreSQL column type used in DDL.
    pub fn native_type(self) -> &'static str {
        match self {
            FieldType::String => "VARCHAR(255)",
            FieldType::LongString => "VARCHAR(500)",
            FieldType::Integer => "INTEGER",
            FieldType::Double => "DOUBLE PRECISION",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Timestamp => "TIMESTAMPTZ",
            FieldType::StringArray => "TEXT[]",
        }
    }

    pub fn is_textual(self) -> bool {
        matches!(self, FieldType::String | FieldType::LongString)
    }

    /// Field type for a result column, from the type name PostgreSQL reports.
    pub fn from_pg_type(name: &str) -> Option<FieldType> {
        match name {
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Some(FieldType::String),
            "INT2" | "INT4" | "INT8" => Some(FieldType::Integer),
            "FLOAT4" | "FLOAT8" => Some(FieldType::Double),
            "BOOL" => Some(FieldType::Boolean),
            "TIMESTAMP" | "TIMESTAMPTZ" => Some(FieldType::Timestamp),
            "TEXT[]" | "VARCHAR[]" => Some(FieldType::StringArray),
            _ => None,
        }
    }

    /// Bind `value` as the next positional parameter. Fails fast when the value's
    /// variant does not match this type; NULL binds as a NULL of this type.
    pub(crate) fn bind<'q>(
        self,
        query: PgQuery<'q>,
        field: &str,
        value: FieldValue,
    ) -> Result<PgQuery<'q>, SchemaError> {
        Ok(match (self, value) {
            (FieldType::String | FieldType::LongString, FieldValue::String(s)) => query.bind(s),
            (FieldType::String | FieldType::LongString, FieldValue::Null) => query.bind(None::<String>),
            (FieldType::Integer, FieldValue::Integer(n)) => query.bind(n),
            (FieldType::Integer, FieldValue::Null) => query.bind(None::<i32>),
            (FieldType::Double, FieldValue::Double(n)) => query.bind(n),
            (FieldType::Double, FieldValue::Null) => query.bind(None::<f64>),
            (FieldType::Boolean, FieldValue::Boolean(b)) => query.bind(b),
            (FieldType::Boolean, FieldValue::Null) => query.bind(None::<bool>),
            (FieldType::Timestamp, FieldValue::Timestamp(t)) => query.bind(t),
            (FieldType::Timestamp, FieldValue::Null) => query.bind(None::<DateTime<Utc>>),
            (FieldType::StringArray, FieldValue::StringArray(v)) => query.bind(v),
            (FieldType::StringArray, FieldValue::Null) => query.bind(None::<Vec<String>>),
            (expected, other) => {
                return Err(SchemaError::TypeMismatch {
                    field: field.to_string(),
                    expected,
                    actual: other.kind(),
                })
            }
        })
    }

    /// Read column `index` of `row` as a value of this type.
    pub(crate) fn decode(self, row: &PgRow, index: usize) -> Result<FieldValue, sqlx::Error> {
        let pg_type = row.columns()[index].type_info().name();
        let value = match self {
            FieldType::String | FieldType::LongString => {
                row.try_get::<Option<String>, _>(index)?.map(FieldValue::String)
            }
            FieldType::Integer => match pg_type {
                "INT2" => row
                    .try_get::<Option<i16>, _>(index)?
                    .map(|n| FieldValue::Integer(n.into())),
                "INT8" => row
                    .try_get::<Option<i64>, _>(index)?
                    .map(|n| {
                        i32::try_from(n)
                            .map(FieldValue::Integer)
                            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
                    })
                    .transpose()?,
                _ => row.try_get::<Option<i32>, _>(index)?.map(FieldValue::Integer),
            },
            FieldType::Double => match pg_type {
                "FLOAT4" => row
                    .try_get::<Option<f32>, _>(index)?
                    .map(|n| FieldValue::Double(n.into())),
                _ => row.try_get::<Option<f64>, _>(index)?.map(FieldValue::Double),
            },
            FieldType::Boolean => row.try_get::<Option<bool>, _>(index)?.map(FieldValue::Boolean),
            FieldType::Timestamp => match pg_type {
                "TIMESTAMP" => row
                    .try_get::<Option<NaiveDateTime>, _>(index)?
                    .map(|t| FieldValue::Timestamp(t.and_utc())),
                _ => row
                    .try_get::<Option<DateTime<Utc>>, _>(index)?
                    .map(FieldValue::Timestamp),
            },
            FieldType::StringArray => row
                .try_get::<Option<Vec<String>>, _>(index)?
                .map(FieldValue::StringArray),
        };
        Ok(value.unwrap_or(FieldValue::Null))
    }
}

/// SQL column constraint, rendered in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldModifier {
    NotNull,
    PrimaryKey,
    Unique,
    /// Integer key assigned by the server.
    Identity,
    DefaultNow,
}

impl FieldModifier {
    pub fn as_sql(self) -> &'static str {
        match self {
            FieldModifier::NotNull => "NOT NULL",
            FieldModifier::PrimaryKey => "PRIMARY KEY",
            FieldModifier::Unique => "UNIQUE",
            FieldModifier::Identity => "GENERATED BY DEFAULT AS IDENTITY",
            FieldModifier::DefaultNow => "DEFAULT CURRENT_TIMESTAMP",
        }
    }

    pub fn is_server_generated(self) -> bool {
        matches!(self, FieldModifier::Identity | FieldModifier::DefaultNow)
    }
}

/// A single column value. `Null` is compatible with every field type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i32),
    Double(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
    StringArray(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::String(_) => "string",
            FieldValue::Integer(_) => "integer",
            FieldValue::Double(_) => "double",
            FieldValue::Boolean(_) => "boolean",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::StringArray(_) => "string array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Type tag implied by the variant; `None` for NULL.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(_) => Some(FieldType::String),
            FieldValue::Integer(_) => Some(FieldType::Integer),
            FieldValue::Double(_) => Some(FieldType::Double),
            FieldValue::Boolean(_) => Some(FieldType::Boolean),
            FieldValue::Timestamp(_) => Some(FieldType::Timestamp),
            FieldValue::StringArray(_) => Some(FieldType::StringArray),
        }
    }

    pub fn matches(&self, ty: FieldType) -> bool {
        match self.field_type() {
            None => true,
            Some(FieldType::String) => ty.is_textual(),
            Some(own) => own == ty,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_string_array(&self) -> Option<&[String]> {
        match self {
            FieldValue::StringArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Double(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(t)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(v: Vec<String>) -> Self {
        FieldValue::StringArray(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Static description of one column: name, type and constraints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SchemaFieldReference {
    name: Cow<'static, str>,
    field_type: FieldType,
    modifiers: Cow<'static, [FieldModifier]>,
}

impl SchemaFieldReference {
    /// For record types' static field tables.
    pub const fn new(
        name: &'static str,
        field_type: FieldType,
        modifiers: &'static [FieldModifier],
    ) -> Self {
        SchemaFieldReference {
            name: Cow::Borrowed(name),
            field_type,
            modifiers: Cow::Borrowed(modifiers),
        }
    }

    /// Ad-hoc column built at runtime.
    pub fn column(name: impl Into<String>, field_type: FieldType) -> Self {
        SchemaFieldReference {
            name: Cow::Owned(name.into()),
            field_type,
            modifiers: Cow::Borrowed(&[]),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<FieldModifier>) -> Self {
        self.modifiers = Cow::Owned(modifiers);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn modifiers(&self) -> &[FieldModifier] {
        &self.modifiers
    }

    pub fn has(&self, modifier: FieldModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_primary_key(&self) -> bool {
        self.has(FieldModifier::PrimaryKey)
    }

    pub fn is_server_generated(&self) -> bool {
        self.modifiers.iter().any(|m| m.is_server_generated())
    }
}

impl fmt::Display for SchemaFieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.field_type.native_type())?;
        for m in self.modifiers.iter() {
            write!(f, " {}", m.as_sql())?;
        }
        Ok(())
    }
}
