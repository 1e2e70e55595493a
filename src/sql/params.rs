//! Binds a statement's parameters into a sqlx query.

use crate::error::SchemaError;
use crate::schema::PgQuery;
use crate::sql::BindParam;

/// Bind `params` in placeholder order. SET/INSERT values come first, then
/// filter operands, as laid out by the builder. The first value whose variant
/// does not match its declared type aborts binding.
pub(crate) fn bind_params<'q>(mut query: PgQuery<'q>, params: &[BindParam]) -> Result<PgQuery<'q>, SchemaError> {
    for p in params {
        query = p.field_type.bind(query, &p.field, p.value.clone())?;
    }
    Ok(query)
}
