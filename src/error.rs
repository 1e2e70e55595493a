//! Typed errors. Contract violations (schema, predicate) are raised; database
//! failures during DML are captured in the operation envelope instead.

use crate::schema::FieldType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("column '{column}' has no matching field in table {table}")]
    UnknownColumn { table: String, column: String },
    #[error("field '{field}' is missing from the result row")]
    MissingField { field: String },
    #[error("column '{column}' is declared {expected:?} but holds a {actual} value")]
    TypeMismatch {
        column: String,
        expected: FieldType,
        actual: &'static str,
    },
    #[error("column '{column}' has unsupported type {pg_type}")]
    UnsupportedColumnType { column: String, pg_type: String },
    #[error("decode column '{column}': {source}")]
    Decode {
        column: String,
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("table {table} needs at least one field")]
    EmptyFieldList { table: String },
    #[error("field '{field}' is declared {expected:?} but the value is {actual}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },
    #[error("table {table} has no primary key field")]
    NoPrimaryKey { table: String },
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

#[derive(Error, Debug)]
pub enum PredicateError {
    #[error("refusing to delete from {table} without a where filter")]
    EmptyDeletePredicate { table: String },
    #[error("invalid operand for '{field}' {operator}: {reason}")]
    InvalidOperand {
        field: String,
        operator: &'static str,
        reason: String,
    },
}

/// The database rejected or failed to run a statement.
#[derive(Error, Debug)]
#[error("database: {0}")]
pub struct ExecutionError(#[from] pub sqlx::Error);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
    #[error("invalid DATABASE_URL: {0}")]
    Url(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Predicate(#[from] PredicateError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        DbError::Execution(ExecutionError(e))
    }
}

impl From<MappingError> for DbError {
    fn from(e: MappingError) -> Self {
        DbError::Schema(SchemaError::Mapping(e))
    }
}
