//! Database-backed checks. They need a reachable PostgreSQL in `DATABASE_URL`:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/thirdplace cargo test -- --ignored
//! ```
//!
//! Each test works in its own throwaway schema, dropped at the end.

use chrono::{DateTime, Utc};
use thirdplace_db::model::{Post, Rsvp, User};
use thirdplace_db::{
    ColumnSetter, Database, DatabaseConfig, DbError, FieldModifier, FieldType, FieldValue, MappingError, Operator,
    SchemaError, SchemaFieldReference, TableManager, TableSchema, WhereFilter,
};

const TABLE: &str = "testt";
const ID: SchemaFieldReference =
    SchemaFieldReference::new("id", FieldType::Integer, &[FieldModifier::PrimaryKey, FieldModifier::Identity]);
const NAME: SchemaFieldReference = SchemaFieldReference::new("name", FieldType::String, &[]);

async fn scratch_db() -> Database {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let config = DatabaseConfig::from_env().expect("config");
    let base = config.connect().await.expect("connect");
    let schema = format!("it_{}", uuid::Uuid::new_v4().simple());
    let db = Database::with_schema(base.pool().clone(), schema);
    db.ensure_schema().await.expect("schema");
    db
}

async fn drop_scratch(db: &Database) {
    let schema = db.schema().expect("scratch schema");
    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(db.pool())
        .await
        .expect("drop schema");
}

async fn count_rows(db: &Database, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!(
        "SELECT count(*) FROM \"{}\".\"{}\"",
        db.schema().unwrap(),
        table
    ))
    .fetch_one(db.pool())
    .await
    .unwrap();
    n
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
}

async fn seed_joes(db: &Database) {
    db.create_table(TABLE, [&ID, &NAME]).await.unwrap();
    for i in 1..=5 {
        let res = db
            .insert_values(TABLE, &[ColumnSetter::new("name", format!("joe{}", i))], false)
            .await
            .unwrap();
        assert!(res.successful());
        assert_eq!(res.payload().rows_inserted, 1);
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn insert_select_update_delete_scenario() {
    let db = scratch_db().await;
    seed_joes(&db).await;

    let all = db.select(TABLE, &["*"], &[]).await.unwrap();
    assert!(all.successful());
    assert_eq!(all.payload().count, 5);

    let joe3 = db.select(TABLE, &["*"], &[WhereFilter::equals(&NAME, "joe3")]).await.unwrap();
    assert_eq!(joe3.payload().count, 1);
    let id = joe3.payload().rows[0].get("id").and_then(FieldValue::as_i32);
    assert_eq!(id, Some(3));

    let updated = db
        .update(TABLE, &[ColumnSetter::new("name", "updated")], &[WhereFilter::equals(&ID, 3)], true)
        .await
        .unwrap();
    assert!(updated.successful());
    let rows = updated.payload().updated.as_ref().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name").and_then(FieldValue::as_str), Some("updated"));

    let deleted = db.delete(TABLE, &[WhereFilter::equals(&ID, 3)]).await.unwrap();
    assert_eq!(deleted.payload().rows_deleted, 1);

    let gone = db.select(TABLE, &["*"], &[WhereFilter::equals(&ID, 3)]).await.unwrap();
    assert_eq!(gone.payload().count, 0);

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn filter_values_are_never_interpreted_as_sql() {
    let db = scratch_db().await;
    seed_joes(&db).await;

    let hostile = db
        .select(TABLE, &["*"], &[WhereFilter::equals(&NAME, "' OR 1=1;")])
        .await
        .unwrap();
    assert!(hostile.successful());
    assert_eq!(hostile.payload().count, 0);
    assert!(!hostile.executed_statement().contains("OR 1=1"));

    let like = db
        .select(TABLE, &["id"], &[WhereFilter::new(&NAME, Operator::Like, "joe%")])
        .await
        .unwrap();
    assert_eq!(like.payload().count, 5);

    let picked = db
        .select(TABLE, &["*"], &[WhereFilter::in_list(&ID, [1, 2])])
        .await
        .unwrap();
    assert_eq!(picked.payload().count, 2);

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn update_matching_nothing_is_still_successful() {
    let db = scratch_db().await;
    seed_joes(&db).await;

    let res = db
        .update(TABLE, &[ColumnSetter::new("name", "x")], &[WhereFilter::equals(&ID, 999)], false)
        .await
        .unwrap();
    assert!(res.successful());
    assert_eq!(res.payload().rows_updated, 0);

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn create_table_twice_keeps_rows() {
    let db = scratch_db().await;
    seed_joes(&db).await;
    assert!(db.table_exists(TABLE).await.unwrap());

    db.create_table(TABLE, [&ID, &NAME]).await.unwrap();
    let all = db.select(TABLE, &["*"], &[]).await.unwrap();
    assert_eq!(all.payload().count, 5);
    assert!(!db.table_exists("not_there").await.unwrap());

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn statement_failure_is_captured_in_the_envelope() {
    let db = scratch_db().await;

    let res = db.select("missing_table", &["*"], &[]).await.unwrap();
    assert!(!res.successful());
    assert!(res.failure().is_some());
    assert_eq!(res.payload().count, 0);
    assert_eq!(res.executed_statement(), format!("SELECT * FROM \"{}\".\"missing_table\"", db.schema().unwrap()));

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn user_round_trip_through_table_manager() {
    let db = scratch_db().await;
    let users = db.table::<User>();
    users.create_table().await.unwrap();

    let mut user = User::new("joe", "pw", "joe@example.com");
    user.first_name = Some("Joe".into());
    let stored = users.insert(&user).await.unwrap();
    let id = stored.id.expect("generated id");
    assert!(stored.created_at.is_some());
    assert_eq!(stored.created_at, stored.updated_at);

    let fetched = users.fetch_by_id(id.into()).await.unwrap().unwrap();
    assert_eq!(fetched, stored);

    let mut renamed = fetched.clone();
    renamed.email = "joe@thirdplace.test".into();
    assert!(users.update(&renamed).await.unwrap());

    let by_email = users
        .fetch_by_filter(&[WhereFilter::equals(User::field("email").unwrap(), "joe@thirdplace.test")])
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);

    let by_text_id = users
        .fetch_by_filter(&[WhereFilter::new(User::field("id").unwrap(), Operator::Like, id.to_string())])
        .await
        .unwrap();
    assert_eq!(by_text_id.len(), 1);

    assert!(users.delete(id.into()).await.unwrap());
    assert!(!users.delete(id.into()).await.unwrap());
    assert!(users.fetch_all().await.unwrap().is_empty());

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn session_runs_inside_caller_transaction() {
    let db = scratch_db().await;
    db.create_table(TABLE, [&ID, &NAME]).await.unwrap();

    let mut tx = db.pool().begin().await.unwrap();
    let res = db
        .on(&mut tx)
        .insert_values(TABLE, &[ColumnSetter::new("name", "temp")], true)
        .await
        .unwrap();
    assert_eq!(res.payload().rows_inserted, 1);
    tx.rollback().await.unwrap();

    let all = db.select(TABLE, &["*"], &[]).await.unwrap();
    assert_eq!(all.payload().count, 0);

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn typed_reads_reject_columns_the_record_does_not_declare() {
    let db = scratch_db().await;
    let users = db.table::<User>();
    users.create_table().await.unwrap();
    users.insert(&User::new("joe", "pw", "joe@example.com")).await.unwrap();

    sqlx::query(&format!(
        "ALTER TABLE \"{}\".\"users\" ADD COLUMN nickname TEXT",
        db.schema().unwrap()
    ))
    .execute(db.pool())
    .await
    .unwrap();

    let err = users.fetch_all().await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Schema(SchemaError::Mapping(MappingError::UnknownColumn { ref column, .. })) if column == "nickname"
    ));

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn returning_write_is_rolled_back_when_its_row_cannot_be_mapped() {
    let db = scratch_db().await;
    sqlx::query(&format!(
        "CREATE TABLE \"{}\".\"{}\" (id INTEGER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY, \
         name VARCHAR(255), amount NUMERIC DEFAULT 1)",
        db.schema().unwrap(),
        TABLE
    ))
    .execute(db.pool())
    .await
    .unwrap();

    let err = db
        .insert_values(TABLE, &[ColumnSetter::new("name", "joe")], true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Schema(SchemaError::Mapping(MappingError::UnsupportedColumnType { .. }))
    ));
    assert_eq!(count_rows(&db, TABLE).await, 0);

    let plain = db
        .insert_values(TABLE, &[ColumnSetter::new("name", "joe")], false)
        .await
        .unwrap();
    assert!(plain.successful());

    let err = db
        .update(TABLE, &[ColumnSetter::new("name", "renamed")], &[WhereFilter::equals(&NAME, "joe")], true)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Schema(SchemaError::Mapping(_))));
    let still = db
        .select(TABLE, &["id", "name"], &[WhereFilter::equals(&NAME, "joe")])
        .await
        .unwrap();
    assert_eq!(still.payload().count, 1);

    let err = db.select(TABLE, &["*"], &[]).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Schema(SchemaError::Mapping(MappingError::UnsupportedColumnType { ref pg_type, .. })) if pg_type == "NUMERIC"
    ));

    drop_scratch(&db).await;
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn post_and_rsvp_round_trip_every_column_type() {
    let db = scratch_db().await;
    let posts = db.table::<Post>();
    let rsvps = db.table::<Rsvp>();
    posts.create_table().await.unwrap();
    rsvps.create_table().await.unwrap();

    let post = Post {
        id: "p1".into(),
        title: "Bouldering".into(),
        author: "ana".into(),
        description: Some("x".repeat(400)),
        created_at: at("2026-05-01T18:00:00Z"),
        end_date: at("2026-05-01T21:30:00Z"),
        group_size: 4,
        tags: vec!["outdoor".into(), "sport".into()],
        location: None,
        latitude: 32.715736,
        longitude: -117.161087,
        proposed_time: at("2026-05-01T19:00:00.123456Z"),
        is_date_activity: true,
        status: "open".into(),
        gender_balance: None,
        category: Some("sport".into()),
    };
    assert_eq!(posts.insert(&post).await.unwrap(), post);
    assert_eq!(posts.fetch_by_id("p1".into()).await.unwrap(), Some(post.clone()));

    let rsvp = Rsvp {
        id: "r1".into(),
        user_id: "u1".into(),
        post_id: post.id.clone(),
        status: "going".into(),
        created_at: at("2026-05-01T18:05:00Z"),
    };
    assert_eq!(rsvps.insert(&rsvp).await.unwrap(), rsvp);
    let for_post = rsvps
        .fetch_by_filter(&[WhereFilter::equals(Rsvp::field("post_id").unwrap(), "p1")])
        .await
        .unwrap();
    assert_eq!(for_post, vec![rsvp]);

    drop_scratch(&db).await;
}
