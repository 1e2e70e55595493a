use crate::error::MappingError;
use crate::schema::{FieldDescriptor, FieldModifier, FieldType, MappedValues, SchemaFieldReference, TableSchema};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One user's answer to a post.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rsvp {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

const REQUIRED: &[FieldModifier] = &[FieldModifier::NotNull];

static RSVP_FIELDS: [FieldDescriptor<Rsvp>; 5] = [
    FieldDescriptor {
        reference: SchemaFieldReference::new("id", FieldType::String, &[FieldModifier::PrimaryKey]),
        get: |r| r.id.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("user_id", FieldType::String, REQUIRED),
        get: |r| r.user_id.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("post_id", FieldType::String, REQUIRED),
        get: |r| r.post_id.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("status", FieldType::String, REQUIRED),
        get: |r| r.status.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("created_at", FieldType::Timestamp, REQUIRED),
        get: |r| r.created_at.into(),
    },
];

impl TableSchema for Rsvp {
    fn table_name() -> &'static str {
        "rsvps"
    }

    fn descriptors() -> &'static [FieldDescriptor<Self>] {
        &RSVP_FIELDS
    }

    fn from_values(mut v: MappedValues) -> Result<Self, MappingError> {
        Ok(Rsvp {
            id: v.string("id")?,
            user_id: v.string("user_id")?,
            post_id: v.string("post_id")?,
            status: v.string("status")?,
            created_at: v.timestamp("created_at")?,
        })
    }
}
