use crate::error::MappingError;
use crate::schema::{FieldDescriptor, FieldModifier::*, FieldType, MappedValues, SchemaFieldReference, TableSchema};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An activity someone proposes and others RSVP to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub group_size: i32,
    pub tags: Vec<String>,
    pub location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub proposed_time: DateTime<Utc>,
    pub is_date_activity: bool,
    pub status: String,
    pub gender_balance: Option<String>,
    pub category: Option<String>,
}

static POST_FIELDS: [FieldDescriptor<Post>; 16] = [
    FieldDescriptor {
        reference: SchemaFieldReference::new("id", FieldType::String, &[PrimaryKey]),
        get: |p| p.id.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("title", FieldType::String, &[NotNull]),
        get: |p| p.title.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("author", FieldType::String, &[NotNull]),
        get: |p| p.author.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("description", FieldType::LongString, &[]),
        get: |p| p.description.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("created_at", FieldType::Timestamp, &[NotNull]),
        get: |p| p.created_at.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("end_date", FieldType::Timestamp, &[NotNull]),
        get: |p| p.end_date.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("group_size", FieldType::Integer, &[NotNull]),
        get: |p| p.group_size.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("tags", FieldType::StringArray, &[]),
        get: |p| p.tags.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("location", FieldType::String, &[]),
        get: |p| p.location.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("latitude", FieldType::Double, &[NotNull]),
        get: |p| p.latitude.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("longitude", FieldType::Double, &[NotNull]),
        get: |p| p.longitude.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("proposed_time", FieldType::Timestamp, &[NotNull]),
        get: |p| p.proposed_time.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("is_date_activity", FieldType::Boolean, &[NotNull]),
        get: |p| p.is_date_activity.into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("status", FieldType::String, &[NotNull]),
        get: |p| p.status.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("gender_balance", FieldType::String, &[]),
        get: |p| p.gender_balance.clone().into(),
    },
    FieldDescriptor {
        reference: SchemaFieldReference::new("category", FieldType::String, &[]),
        get: |p| p.category.clone().into(),
    },
];

impl TableSchema for Post {
    fn table_name() -> &'static str {
        "posts"
    }

    fn descriptors() -> &'static [FieldDescriptor<Self>] {
        &POST_FIELDS
    }

    fn from_values(mut v: MappedValues) -> Result<Self, MappingError> {
        Ok(Post {
            id: v.string("id")?,
            title: v.string("title")?,
            author: v.string("author")?,
            description: v.opt_string("description")?,
            created_at: v.timestamp("created_at")?,
            end_date: v.timestamp("end_date")?,
            group_size: v.integer("group_size")?,
            tags: v.string_array("tags")?,
            location: v.opt_string("location")?,
            latitude: v.double("latitude")?,
            longitude: v.double("longitude")?,
            proposed_time: v.timestamp("proposed_time")?,
            is_date_activity: v.boolean("is_date_activity")?,
            status: v.string("status")?,
            gender_balance: v.opt_string("gender_balance")?,
            category: v.opt_string("category")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{map_record, Row};
    use crate::schema::{record_setters, FieldValue};
    use crate::sql;

    fn sample() -> Post {
        let now = DateTime::parse_from_rfc3339("2026-05-01T18:00:00Z").unwrap().with_timezone(&Utc);
        Post {
            id: "p-1".into(),
            title: "Climbing".into(),
            author: "ana".into(),
            description: None,
            created_at: now,
            end_date: now,
            group_size: 4,
            tags: vec!["outdoor".into()],
            location: Some("Mesa Rim".into()),
            latitude: 32.7,
            longitude: -117.1,
            proposed_time: now,
            is_date_activity: false,
            status: "open".into(),
            gender_balance: None,
            category: Some("sport".into()),
        }
    }

    #[test]
    fn ddl_lists_every_field() {
        let ddl = sql::create_table("posts", Post::fields()).unwrap();
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"posts\" (\"id\" VARCHAR(255) PRIMARY KEY, "));
        assert!(ddl.contains("\"description\" VARCHAR(500)"));
        assert!(ddl.contains("\"tags\" TEXT[]"));
        assert!(ddl.contains("\"latitude\" DOUBLE PRECISION NOT NULL"));
    }

    #[test]
    fn setters_round_trip_through_mapping() {
        let post = sample();
        let row = Row::new(
            record_setters(&post, true)
                .into_iter()
                .map(|s| (s.column().to_string(), s.value().clone()))
                .collect(),
        );
        assert_eq!(map_record::<Post>(row).unwrap(), post);
    }

    #[test]
    fn missing_array_maps_to_empty() {
        let post = sample();
        let mut columns: Vec<(String, FieldValue)> = record_setters(&post, true)
            .into_iter()
            .map(|s| (s.column().to_string(), s.value().clone()))
            .collect();
        columns.retain(|(name, _)| name != "tags");
        let mapped = map_record::<Post>(Row::new(columns)).unwrap();
        assert!(mapped.tags.is_empty());
        assert_eq!(mapped.description, None);
    }
}
