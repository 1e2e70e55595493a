//! Environment-driven connection settings.

use crate::error::{ConfigError, DbError};
use crate::service::Database;
use crate::sql::is_valid_identifier;
use sqlx::postgres::PgPoolOptions;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/thirdplace";
pub const DEFAULT_SCHEMA: &str = "prod";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    /// Namespace for unqualified table names. None uses the connection's search path.
    pub schema: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            url: DEFAULT_DATABASE_URL.into(),
            schema: Some(DEFAULT_SCHEMA.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// Loads `.env` if present, then reads `DATABASE_URL`, `THIRDPLACE_SCHEMA`
    /// (empty disables qualification) and `THIRDPLACE_MAX_CONNECTIONS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = DatabaseConfig::default();
        if let Some(url) = lookup("DATABASE_URL") {
            config.url = url;
        }
        if let Some(schema) = lookup("THIRDPLACE_SCHEMA") {
            let schema = schema.trim();
            config.schema = if schema.is_empty() {
                None
            } else if is_valid_identifier(schema) {
                Some(schema.to_string())
            } else {
                return Err(ConfigError::InvalidVar {
                    name: "THIRDPLACE_SCHEMA",
                    reason: format!("{:?} is not a plain identifier", schema),
                });
            };
        }
        if let Some(max) = lookup("THIRDPLACE_MAX_CONNECTIONS") {
            config.max_connections = match max.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        name: "THIRDPLACE_MAX_CONNECTIONS",
                        reason: format!("expected a positive integer, got {:?}", max),
                    })
                }
            };
        }
        Ok(config)
    }

    /// Opens the pool and wraps it in a `Database` bound to the configured schema.
    pub async fn connect(&self) -> Result<Database, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;
        tracing::info!(max_connections = self.max_connections, schema = ?self.schema, "connected");
        Ok(match &self.schema {
            Some(schema) => Database::with_schema(pool, schema.clone()),
            None => Database::new(pool),
        })
    }
}
