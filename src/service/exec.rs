//! Statement execution against one leased connection.
//!
//! Each call: generate → bind → lease → execute → map → envelope. Contract
//! violations return `Err`; database failures are captured in the envelope.
//! The lease is dropped (and a pooled connection returned) before returning.
//! A pool-backed write that returns rows commits only after those rows map.

use crate::error::DbError;
use crate::mapper::{map_row, row_to_record};
use crate::response::{DeleteResult, InsertResult, OperationResult, QueryOperation, QueryResult, UpdateResult};
use crate::schema::{SchemaFieldReference, TableSchema};
use crate::sql::{self, bind_params, ColumnSetter, Statement, WhereFilter};
use crate::store;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};

/// Where a call gets its connection from.
pub(crate) enum Target<'a> {
    Pool(&'a PgPool),
    /// Caller-owned connection, e.g. inside a transaction.
    Conn(&'a mut PgConnection),
}

enum Lease<'a> {
    Pooled(PoolConnection<Postgres>),
    Atomic(Transaction<'static, Postgres>),
    Borrowed(&'a mut PgConnection),
}

impl<'a> Target<'a> {
    async fn lease(self) -> Result<Lease<'a>, sqlx::Error> {
        match self {
            Target::Pool(pool) => Ok(Lease::Pooled(pool.acquire().await?)),
            Target::Conn(conn) => Ok(Lease::Borrowed(conn)),
        }
    }

    /// Like `lease`, but a pool target opens a transaction that rolls back
    /// unless `Lease::commit` is reached. A borrowed connection is left to
    /// its owner.
    async fn lease_atomic(self) -> Result<Lease<'a>, sqlx::Error> {
        match self {
            Target::Pool(pool) => Ok(Lease::Atomic(pool.begin().await?)),
            Target::Conn(conn) => Ok(Lease::Borrowed(conn)),
        }
    }
}

impl Lease<'_> {
    async fn commit(self) -> Result<(), sqlx::Error> {
        match self {
            Lease::Atomic(tx) => tx.commit().await,
            Lease::Pooled(_) | Lease::Borrowed(_) => Ok(()),
        }
    }
}

impl Deref for Lease<'_> {
    type Target = PgConnection;

    fn deref(&self) -> &PgConnection {
        match self {
            Lease::Pooled(c) => c,
            Lease::Atomic(tx) => tx,
            Lease::Borrowed(c) => c,
        }
    }
}

impl DerefMut for Lease<'_> {
    fn deref_mut(&mut self) -> &mut PgConnection {
        match self {
            Lease::Pooled(c) => c,
            Lease::Atomic(tx) => tx,
            Lease::Borrowed(c) => c,
        }
    }
}

/// `table` qualified with the namespace unless it already names one.
pub(crate) fn qualify(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(s) if !table.contains('.') => format!("{}.{}", s, table),
        _ => table.to_string(),
    }
}

fn envelope<P: Default>(
    sql: String,
    operation: QueryOperation,
    outcome: Result<P, DbError>,
) -> Result<OperationResult<P>, DbError> {
    match outcome {
        Ok(payload) => Ok(OperationResult::succeeded(sql, operation, payload)),
        Err(DbError::Execution(e)) => {
            tracing::warn!(operation = ?operation, sql = %sql, error = %e, "statement failed");
            Ok(OperationResult::failed(sql, operation, e))
        }
        Err(other) => Err(other),
    }
}

pub(crate) async fn ensure_schema(target: Target<'_>, schema: &str) -> Result<(), DbError> {
    let mut conn = target.lease().await?;
    store::ensure_schema(&mut conn, schema).await
}

/// DDL failures are raised, not captured.
pub(crate) async fn create_table<'f>(
    target: Target<'_>,
    schema: Option<&str>,
    table: &str,
    fields: impl IntoIterator<Item = &'f SchemaFieldReference>,
) -> Result<(), DbError> {
    let ddl = sql::create_table(&qualify(schema, table), fields)?;
    tracing::debug!(sql = %ddl, "ddl");
    let mut conn = target.lease().await?;
    sqlx::query(&ddl).execute(&mut *conn).await?;
    tracing::info!(table = %table, "table ready");
    Ok(())
}

pub(crate) async fn table_exists(target: Target<'_>, schema: Option<&str>, table: &str) -> Result<bool, DbError> {
    let (schema, name) = match table.split_once('.') {
        Some((s, t)) => (Some(s), t),
        None => (schema, table),
    };
    let mut conn = target.lease().await?;
    Ok(store::table_exists(&mut conn, schema, name).await?)
}

pub(crate) async fn insert(
    target: Target<'_>,
    stmt: Statement,
    returning: bool,
) -> Result<OperationResult<InsertResult>, DbError> {
    let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
    tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
    let outcome = async {
        if returning {
            let mut conn = target.lease_atomic().await?;
            let row = query.fetch_optional(&mut *conn).await?;
            let inserted = row.as_ref().map(row_to_record).transpose()?;
            conn.commit().await?;
            Ok(InsertResult {
                rows_inserted: u64::from(inserted.is_some()),
                inserted,
            })
        } else {
            let mut conn = target.lease().await?;
            let done = query.execute(&mut *conn).await?;
            Ok(InsertResult {
                inserted: None,
                rows_inserted: done.rows_affected(),
            })
        }
    }
    .await;
    envelope(stmt.sql, QueryOperation::Insert, outcome)
}

pub(crate) async fn update(
    target: Target<'_>,
    stmt: Statement,
    returning: bool,
) -> Result<OperationResult<UpdateResult>, DbError> {
    let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
    tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
    let outcome = async {
        if returning {
            let mut conn = target.lease_atomic().await?;
            let rows = query.fetch_all(&mut *conn).await?;
            let updated = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;
            conn.commit().await?;
            Ok(UpdateResult {
                rows_updated: updated.len() as u64,
                updated: Some(updated),
            })
        } else {
            let mut conn = target.lease().await?;
            let done = query.execute(&mut *conn).await?;
            Ok(UpdateResult {
                updated: None,
                rows_updated: done.rows_affected(),
            })
        }
    }
    .await;
    envelope(stmt.sql, QueryOperation::Update, outcome)
}

pub(crate) async fn select(target: Target<'_>, stmt: Statement) -> Result<OperationResult<QueryResult>, DbError> {
    let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
    tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
    let outcome = async {
        let mut conn = target.lease().await?;
        let rows = query.fetch_all(&mut *conn).await?;
        let rows = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;
        Ok(QueryResult {
            count: rows.len(),
            rows,
        })
    }
    .await;
    envelope(stmt.sql, QueryOperation::Select, outcome)
}

pub(crate) async fn delete(target: Target<'_>, stmt: Statement) -> Result<OperationResult<DeleteResult>, DbError> {
    let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
    tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
    let outcome = async {
        let mut conn = target.lease().await?;
        let done = query.execute(&mut *conn).await?;
        Ok(DeleteResult {
            rows_deleted: done.rows_affected(),
        })
    }
    .await;
    envelope(stmt.sql, QueryOperation::Delete, outcome)
}

/// Typed read of every column, so a column `T` does not declare fails with
/// `UnknownColumn`. Every failure is raised.
pub(crate) async fn select_as<T: TableSchema>(
    target: Target<'_>,
    schema: Option<&str>,
    filters: &[WhereFilter],
) -> Result<Vec<T>, DbError> {
    let stmt = sql::select(&qualify(schema, T::table_name()), &["*"], filters)?;
    let query = bind_params(sqlx::query(&stmt.sql), &stmt.params)?;
    tracing::debug!(sql = %stmt.sql, params = ?stmt.params, "query");
    let mut conn = target.lease().await?;
    let rows = query.fetch_all(&mut *conn).await?;
    Ok(rows.iter().map(map_row::<T>).collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn insert_statement<T: TableSchema>(
    schema: Option<&str>,
    table: &str,
    record: &T,
    returning: bool,
) -> Result<Statement, DbError> {
    Ok(sql::insert_record(&qualify(schema, table), record, returning)?)
}

pub(crate) fn insert_values_statement(
    schema: Option<&str>,
    table: &str,
    setters: &[ColumnSetter],
    returning: bool,
) -> Result<Statement, DbError> {
    Ok(sql::insert(&qualify(schema, table), setters, returning)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualify_keeps_explicit_namespace() {
        assert_eq!(qualify(Some("prod"), "testt"), "prod.testt");
        assert_eq!(qualify(Some("prod"), "other.testt"), "other.testt");
        assert_eq!(qualify(None, "testt"), "testt");
    }
}
