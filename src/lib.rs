//! Thirdplace DB: schema-driven SQL generation, binding and row mapping over PostgreSQL.

pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod response;
pub mod schema;
pub mod service;
pub mod sql;
pub mod store;

pub use config::DatabaseConfig;
pub use error::{ConfigError, DbError, ExecutionError, MappingError, PredicateError, SchemaError};
pub use mapper::{map_record, map_row, row_to_record, Row};
pub use response::{DeleteResult, InsertResult, OperationResult, QueryOperation, QueryResult, UpdateResult};
pub use schema::{FieldDescriptor, FieldModifier, FieldType, FieldValue, MappedValues, SchemaFieldReference, TableSchema};
pub use service::{Database, SchemaTable, Session, TableManager};
pub use sql::{ColumnSetter, Operator, WhereFilter};
pub use store::ensure_database_exists;
