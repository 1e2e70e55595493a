//! Database, namespace and catalog helpers that sit outside the statement builder.

use crate::error::{ConfigError, DbError};
use crate::sql::quoted;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, PgConnection};
use std::str::FromStr;

/// Create the database named in `database_url` if it does not exist yet.
/// Connects to the `postgres` maintenance database on the same server to do so.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), DbError> {
    let (admin, db_name) = admin_options(database_url)?;
    let db_name = match db_name {
        Some(name) if !name.is_empty() && name != "postgres" => name,
        _ => return Ok(()),
    };
    let mut conn: PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)?))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

/// Options for the maintenance database on the server `url` points at, plus
/// the database name `url` selects, if any.
fn admin_options(url: &str) -> Result<(PgConnectOptions, Option<String>), ConfigError> {
    let opts = PgConnectOptions::from_str(url).map_err(|e| ConfigError::Url(e.to_string()))?;
    let db_name = opts.get_database().map(str::to_string);
    Ok((opts.database("postgres"), db_name))
}

pub(crate) async fn ensure_schema(conn: &mut PgConnection, schema: &str) -> Result<(), DbError> {
    let ddl = format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)?);
    tracing::debug!(sql = %ddl, "ddl");
    sqlx::query(&ddl).execute(conn).await?;
    Ok(())
}

/// Catalog lookup; `schema: None` means the connection's current schema.
pub(crate) async fn table_exists(
    conn: &mut PgConnection,
    schema: Option<&str>,
    table: &str,
) -> Result<bool, sqlx::Error> {
    let exists: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
         WHERE table_schema = COALESCE($1, current_schema()) AND table_name = $2)",
    )
    .bind(schema)
    .bind(table)
    .fetch_one(conn)
    .await?;
    Ok(exists.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_options_keep_server_and_swap_database() {
        let (admin, name) = admin_options("postgres://u:p@localhost:5432/thirdplace?sslmode=disable").unwrap();
        assert_eq!(name.as_deref(), Some("thirdplace"));
        assert_eq!(admin.get_host(), "localhost");
        assert_eq!(admin.get_port(), 5432);
        assert_eq!(admin.get_database(), Some("postgres"));
    }

    #[test]
    fn url_without_path_keeps_credentials_and_host() {
        let (admin, name) = admin_options("postgres://app:pw@db:5432").unwrap();
        assert_ne!(name.as_deref(), Some("app:pw@db:5432"));
        assert_eq!(admin.get_host(), "db");
        assert_eq!(admin.get_port(), 5432);
        assert_eq!(admin.get_username(), "app");
        assert_eq!(admin.get_database(), Some("postgres"));
    }

    #[test]
    fn slashes_in_query_parameters_do_not_change_the_database() {
        let (admin, name) =
            admin_options("postgres://db/thirdplace?sslmode=verify-full&sslrootcert=/etc/ssl/ca.pem").unwrap();
        assert_eq!(name.as_deref(), Some("thirdplace"));
        assert_eq!(admin.get_host(), "db");
    }

    #[test]
    fn malformed_url_is_a_config_error() {
        assert!(matches!(admin_options("not a url"), Err(ConfigError::Url(_))));
    }
}
