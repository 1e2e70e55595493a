use super::exec::{self, Target};
use crate::error::DbError;
use crate::response::{DeleteResult, InsertResult, OperationResult, QueryResult, UpdateResult};
use crate::schema::{SchemaFieldReference, TableSchema};
use crate::service::SchemaTable;
use crate::sql::{self, ColumnSetter, WhereFilter};
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;

/// Query coordinator over a connection pool. Each call leases one connection
/// and returns it when the call completes. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    schema: Option<Arc<str>>,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Database { pool, schema: None }
    }

    /// Unqualified table names resolve into `schema`.
    pub fn with_schema(pool: PgPool, schema: impl Into<String>) -> Self {
        Database {
            pool,
            schema: Some(Arc::from(schema.into())),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Run calls on a caller-owned connection, e.g. `db.on(&mut tx)`.
    pub fn on<'c>(&self, conn: &'c mut PgConnection) -> Session<'c> {
        Session {
            conn,
            schema: self.schema.clone(),
        }
    }

    /// Typed repository for `T`.
    pub fn table<T: TableSchema>(&self) -> SchemaTable<T> {
        SchemaTable::new(self.clone())
    }

    /// `CREATE SCHEMA IF NOT EXISTS` for the configured schema; no-op without one.
    pub async fn ensure_schema(&self) -> Result<(), DbError> {
        match self.schema() {
            Some(schema) => exec::ensure_schema(Target::Pool(&self.pool), schema).await,
            None => Ok(()),
        }
    }

    pub async fn create_table<'f>(
        &self,
        table: &str,
        fields: impl IntoIterator<Item = &'f SchemaFieldReference>,
    ) -> Result<(), DbError> {
        exec::create_table(Target::Pool(&self.pool), self.schema(), table, fields).await
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        exec::table_exists(Target::Pool(&self.pool), self.schema(), table).await
    }

    /// Insert every field of `record`, leaving out server-generated fields with no value.
    pub async fn insert<T: TableSchema>(
        &self,
        table: &str,
        record: &T,
        return_inserted: bool,
    ) -> Result<OperationResult<InsertResult>, DbError> {
        let stmt = exec::insert_statement(self.schema(), table, record, return_inserted)?;
        exec::insert(Target::Pool(&self.pool), stmt, return_inserted).await
    }

    pub async fn insert_values(
        &self,
        table: &str,
        setters: &[ColumnSetter],
        return_inserted: bool,
    ) -> Result<OperationResult<InsertResult>, DbError> {
        let stmt = exec::insert_values_statement(self.schema(), table, setters, return_inserted)?;
        exec::insert(Target::Pool(&self.pool), stmt, return_inserted).await
    }

    /// No filters updates every row.
    pub async fn update(
        &self,
        table: &str,
        setters: &[ColumnSetter],
        filters: &[WhereFilter],
        return_updated: bool,
    ) -> Result<OperationResult<UpdateResult>, DbError> {
        let stmt = sql::update(&exec::qualify(self.schema(), table), setters, filters, return_updated)?;
        exec::update(Target::Pool(&self.pool), stmt, return_updated).await
    }

    /// Refuses to run without at least one filter.
    pub async fn delete(&self, table: &str, filters: &[WhereFilter]) -> Result<OperationResult<DeleteResult>, DbError> {
        let stmt = sql::delete(&exec::qualify(self.schema(), table), filters)?;
        exec::delete(Target::Pool(&self.pool), stmt).await
    }

    pub async fn select(
        &self,
        table: &str,
        columns: &[&str],
        filters: &[WhereFilter],
    ) -> Result<OperationResult<QueryResult>, DbError> {
        let stmt = sql::select(&exec::qualify(self.schema(), table), columns, filters)?;
        exec::select(Target::Pool(&self.pool), stmt).await
    }

    /// Select `T`'s columns from `T::table_name()` and map each row into `T`.
    pub async fn select_as<T: TableSchema>(&self, filters: &[WhereFilter]) -> Result<Vec<T>, DbError> {
        exec::select_as(Target::Pool(&self.pool), self.schema(), filters).await
    }
}

/// The same operations bound to one caller-owned connection. Nothing here
/// commits or rolls back; the caller owns the transaction. A returning write
/// whose rows fail to map has still run on that connection, so the caller
/// should roll back on `Err`.
pub struct Session<'c> {
    conn: &'c mut PgConnection,
    schema: Option<Arc<str>>,
}

impl Session<'_> {
    fn target(&mut self) -> Target<'_> {
        Target::Conn(&mut *self.conn)
    }

    pub async fn create_table<'f>(
        &mut self,
        table: &str,
        fields: impl IntoIterator<Item = &'f SchemaFieldReference>,
    ) -> Result<(), DbError> {
        let schema = self.schema.clone();
        exec::create_table(self.target(), schema.as_deref(), table, fields).await
    }

    pub async fn table_exists(&mut self, table: &str) -> Result<bool, DbError> {
        let schema = self.schema.clone();
        exec::table_exists(self.target(), schema.as_deref(), table).await
    }

    pub async fn insert<T: TableSchema>(
        &mut self,
        table: &str,
        record: &T,
        return_inserted: bool,
    ) -> Result<OperationResult<InsertResult>, DbError> {
        let stmt = exec::insert_statement(self.schema.as_deref(), table, record, return_inserted)?;
        exec::insert(self.target(), stmt, return_inserted).await
    }

    pub async fn insert_values(
        &mut self,
        table: &str,
        setters: &[ColumnSetter],
        return_inserted: bool,
    ) -> Result<OperationResult<InsertResult>, DbError> {
        let stmt = exec::insert_values_statement(self.schema.as_deref(), table, setters, return_inserted)?;
        exec::insert(self.target(), stmt, return_inserted).await
    }

    pub async fn update(
        &mut self,
        table: &str,
        setters: &[ColumnSetter],
        filters: &[WhereFilter],
        return_updated: bool,
    ) -> Result<OperationResult<UpdateResult>, DbError> {
        let stmt = sql::update(
            &exec::qualify(self.schema.as_deref(), table),
            setters,
            filters,
            return_updated,
        )?;
        exec::update(self.target(), stmt, return_updated).await
    }

    pub async fn delete(
        &mut self,
        table: &str,
        filters: &[WhereFilter],
    ) -> Result<OperationResult<DeleteResult>, DbError> {
        let stmt = sql::delete(&exec::qualify(self.schema.as_deref(), table), filters)?;
        exec::delete(self.target(), stmt).await
    }

    pub async fn select(
        &mut self,
        table: &str,
        columns: &[&str],
        filters: &[WhereFilter],
    ) -> Result<OperationResult<QueryResult>, DbError> {
        let stmt = sql::select(&exec::qualify(self.schema.as_deref(), table), columns, filters)?;
        exec::select(self.target(), stmt).await
    }

    pub async fn select_as<T: TableSchema>(&mut self, filters: &[WhereFilter]) -> Result<Vec<T>, DbError> {
        let schema = self.schema.clone();
        exec::select_as(self.target(), schema.as_deref(), filters).await
    }
}
