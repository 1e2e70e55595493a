use crate::error::MappingError;
use crate::schema::{FieldDescriptor, FieldModifier::*, FieldType, MappedValues, SchemaFieldReference, TableSchema};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Account row. `id` and both timestamps are filled in by the database.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: Option<i32>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: impl Into<String>, password: impl Into<String>, email: impl Into<String>) -> Self {
        User {
            id: None,
            username: username.into(),
            password: password.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            created_at: None,
            updated_at: None,
        }
    }
}

static USER_FIELDS: [FieldDescriptor<User>; 8] = [
    FieldDescriptor {
        reference: SchemaFieldReference::new("id", FieldType::Integer, &[PrimaryKey, Identity]),
        get: |u| u.id.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("username", FieldType::String, &[NotNull, Unique]),
        get: |u| u.username.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("password", FieldType::String, &[NotNull]),
        get: |u| u.password.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("email", FieldType::String, &[NotNull]),
        get: |u| u.email.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("first_name", FieldType::String, &[]),
        get: |u| u.first_name.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("last_name", FieldType::String, &[]),
        get: |u| u.last_name.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("created_at", FieldType::Timestamp, &[DefaultNow]),
        get: |u| u.created_at.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("updated_at", FieldType::Timestamp, &[DefaultNow]),
        get: |u| u.updated_at.into(),
    },
];

impl TableSchema for User {
    fn table_name() -> &'static str {
        "users"
    }

    fn descriptors() -> &'static [FieldDescriptor<Self>] {
        &USER_FIELDS
    }

    fn from_values(mut v: MappedValues) -> Result<Self, MappingError> {
        Ok(User {
            id: v.opt_integer("id")?,
            username: v.string("username")?,
            password: v.string("password")?,
            email: v.string("email")?,
            first_name: v.opt_string("first_name")?,
            last_name: v.opt_string("last_name")?,
            created_at: v.opt_timestamp("created_at")?,
            updated_at: v.opt_timestamp("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql;

    #[test]
    fn insert_leaves_generated_columns_to_the_database() {
        let stmt = sql::insert_record("prod.users", &User::new("joe", "pw", "joe@example.com"), true).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"prod\".\"users\" (\"username\", \"password\", \"email\", \"first_name\", \"last_name\") \
             VALUES ($1, $2, $3, $4, $5) RETURNING *"
        );
    }

    #[test]
    fn ddl_declares_identity_and_defaults() {
        let ddl = sql::create_table("users", User::fields()).unwrap();
        assert!(ddl.contains("\"id\" INTEGER PRIMARY KEY GENERATED BY DEFAULT AS IDENTITY"));
        assert!(ddl.contains("\"username\" VARCHAR(255) NOT NULL UNIQUE"));
        assert!(ddl.contains("\"created_at\" TIMESTAMPTZ DEFAULT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn password_is_not_serialized() {
        let json = serde_json::to_value(User::new("joe", "secret", "joe@example.com")).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "joe");
    }
}
