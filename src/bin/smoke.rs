//! Runs insert/select/update/delete against `DATABASE_URL` on a scratch table
//! and prints each envelope as JSON.

use thirdplace_db::{
    ensure_database_exists, ColumnSetter, DatabaseConfig, FieldModifier, FieldType, SchemaFieldReference,
    WhereFilter,
};
use tracing_subscriber::EnvFilter;

const TABLE: &str = "testt";
const ID: SchemaFieldReference =
    SchemaFieldReference::new("id", FieldType::Integer, &[FieldModifier::PrimaryKey, FieldModifier::Identity]);
const NAME: SchemaFieldReference = SchemaFieldReference::new("name", FieldType::String, &[]);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DatabaseConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thirdplace_db=debug,smoke=info")),
        )
        .init();

    ensure_database_exists(&config.url).await?;
    let db = config.connect().await?;
    db.ensure_schema().await?;

    let qualified = match db.schema() {
        Some(schema) => format!("\"{}\".\"{}\"", schema, TABLE),
        None => format!("\"{}\"", TABLE),
    };
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", qualified))
        .execute(db.pool())
        .await?;
    db.create_table(TABLE, [&ID, &NAME]).await?;

    for i in 1..=5 {
        let inserted = db
            .insert_values(TABLE, &[ColumnSetter::new("name", format!("joe{}", i))], false)
            .await?;
        tracing::info!(rows = inserted.payload().rows_inserted, "inserted joe{}", i);
    }

    let all = db.select(TABLE, &["*"], &[]).await?;
    println!("{}", serde_json::to_string_pretty(all.payload())?);

    let joe3 = db.select(TABLE, &["*"], &[WhereFilter::equals(&NAME, "joe3")]).await?;
    let id = joe3
        .payload()
        .rows
        .first()
        .and_then(|row| row.get("id"))
        .and_then(|v| v.as_i32())
        .ok_or("joe3 not found")?;
    tracing::info!(id, "found joe3");

    let updated = db
        .update(
            TABLE,
            &[ColumnSetter::new("name", "updated")],
            &[WhereFilter::equals(&ID, id)],
            true,
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(updated.payload())?);

    let deleted = db.delete(TABLE, &[WhereFilter::equals(&ID, id)]).await?;
    tracing::info!(rows = deleted.payload().rows_deleted, "deleted");

    let after = db.select(TABLE, &["*"], &[WhereFilter::equals(&ID, id)]).await?;
    tracing::info!(count = after.payload().count, "rows left with id {}", id);
    Ok(())
}
