use crate::error::{DbError, ExecutionError, SchemaError};
use crate::mapper::map_record;
use crate::schema::{record_setters, FieldValue, SchemaFieldReference, TableSchema};
use crate::service::Database;
use crate::sql::WhereFilter;
use async_trait::async_trait;
use std::marker::PhantomData;

/// Per-record-type table operations.
#[async_trait]
pub trait TableManager<T: TableSchema>: Send + Sync {
    async fn create_table(&self) -> Result<(), DbError>;

    /// Stores `record` and returns it as stored, generated values included.
    async fn insert(&self, record: &T) -> Result<T, DbError>;

    async fn fetch_by_id(&self, id: FieldValue) -> Result<Option<T>, DbError>;

    async fn fetch_all(&self) -> Result<Vec<T>, DbError>;

    async fn fetch_by_filter(&self, filters: &[WhereFilter]) -> Result<Vec<T>, DbError>;

    /// Overwrites the row with `record`'s primary key. False when no row matched.
    async fn update(&self, record: &T) -> Result<bool, DbError>;

    async fn delete(&self, id: FieldValue) -> Result<bool, DbError>;
}

/// `TableManager` over `Database`, using `T::table_name()` and `T::fields()`.
pub struct SchemaTable<T> {
    db: Database,
    _record: PhantomData<fn() -> T>,
}

impl<T: TableSchema> SchemaTable<T> {
    pub fn new(db: Database) -> Self {
        SchemaTable {
            db,
            _record: PhantomData,
        }
    }

    fn primary_key() -> Result<&'static SchemaFieldReference, DbError> {
        T::primary_key().ok_or_else(|| {
            SchemaError::NoPrimaryKey {
                table: T::table_name().to_string(),
            }
            .into()
        })
    }

    fn id_of(record: &T) -> Result<FieldValue, DbError> {
        T::descriptors()
            .iter()
            .find(|d| d.reference.is_primary_key())
            .map(|d| (d.get)(record))
            .ok_or_else(|| {
                SchemaError::NoPrimaryKey {
                    table: T::table_name().to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl<T: TableSchema> TableManager<T> for SchemaTable<T> {
    async fn create_table(&self) -> Result<(), DbError> {
        self.db.create_table(T::table_name(), T::fields()).await
    }

    async fn insert(&self, record: &T) -> Result<T, DbError> {
        let result = self.db.insert(T::table_name(), record, true).await?.into_result()?;
        let row = result
            .inserted
            .ok_or(ExecutionError(sqlx::Error::RowNotFound))?;
        Ok(map_record(row)?)
    }

    async fn fetch_by_id(&self, id: FieldValue) -> Result<Option<T>, DbError> {
        let pk = Self::primary_key()?;
        let mut found = self.db.select_as::<T>(&[WhereFilter::equals(pk, id)]).await?;
        Ok(if found.is_empty() { None } else { Some(found.swap_remove(0)) })
    }

    async fn fetch_all(&self) -> Result<Vec<T>, DbError> {
        self.db.select_as::<T>(&[]).await
    }

    async fn fetch_by_filter(&self, filters: &[WhereFilter]) -> Result<Vec<T>, DbError> {
        self.db.select_as::<T>(filters).await
    }

    async fn update(&self, record: &T) -> Result<bool, DbError> {
        let pk = Self::primary_key()?;
        let filter = WhereFilter::equals(pk, Self::id_of(record)?);
        let setters = record_setters(record, false);
        let result = self
            .db
            .update(T::table_name(), &setters, &[filter], false)
            .await?
            .into_result()?;
        Ok(result.rows_updated > 0)
    }

    async fn delete(&self, id: FieldValue) -> Result<bool, DbError> {
        let pk = Self::primary_key()?;
        let result = self
            .db
            .delete(T::table_name(), &[WhereFilter::equals(pk, id)])
            .await?
            .into_result()?;
        Ok(result.rows_deleted > 0)
    }
}
