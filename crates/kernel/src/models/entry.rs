//! Content entries and the kinds of content they belong to.
//!
//! Every content record is stored as an [`Entry`]: a numeric id, the kind it
//! belongs to, and a JSON object of attributes. The shape of the attributes is
//! described per kind by the schemas in [`crate::content::ContentTypeSchema`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Attribute object carried by entries and write payloads.
pub type Attributes = Map<String, Value>;

/// The content kinds served by this backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    BlogPost,
    Category,
    Tag,
}

impl EntityKind {
    /// All kinds, in seeding dependency order (referenced kinds last).
    pub const ALL: [EntityKind; 3] = [EntityKind::Category, EntityKind::Tag, EntityKind::BlogPost];

    /// Unique identifier used to build permission actions.
    pub fn uid(self) -> &'static str {
        match self {
            Self::BlogPost => "api::blog-post.blog-post",
            Self::Category => "api::category.category",
            Self::Tag => "api::tag.tag",
        }
    }

    /// Plural name used in REST paths (`/api/{collection}`).
    pub fn collection(self) -> &'static str {
        match self {
            Self::BlogPost => "blog-posts",
            Self::Category => "categories",
            Self::Tag => "tags",
        }
    }

    /// Singular machine name, also the value stored in the `kind` column.
    pub fn singular(self) -> &'static str {
        match self {
            Self::BlogPost => "blog-post",
            Self::Category => "category",
            Self::Tag => "tag",
        }
    }

    /// Resolve a REST collection name.
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == collection)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for EntityKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.singular() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown entity kind '{s}'"))
    }
}

/// A stored content record.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: i64,
    pub kind: EntityKind,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// The entry's slug, when it carries a string one.
    pub fn slug(&self) -> Option<&str> {
        self.attributes.get("slug").and_then(Value::as_str)
    }
}

/// Entries serialize flat: `{ "id": 1, ...attributes, "createdAt", "updatedAt" }`.
impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len() + 3))?;
        map.serialize_entry("id", &self.id)?;
        for (key, value) in &self.attributes {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("createdAt", &self.created_at)?;
        map.serialize_entry("updatedAt", &self.updated_at)?;
        map.end()
    }
}

/// Build the permission action for an operation on a kind, e.g.
/// `api::tag.tag.findOne`.
pub fn action_for(kind: EntityKind, operation: &str) -> String {
    format!("{}.{operation}", kind.uid())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_collection(kind.collection()), Some(kind));
            assert_eq!(kind.singular().parse::<EntityKind>().unwrap(), kind);
        }
        assert_eq!(EntityKind::from_collection("authors"), None);
    }

    #[test]
    fn actions_use_the_uid() {
        assert_eq!(
            action_for(EntityKind::BlogPost, "find"),
            "api::blog-post.blog-post.find"
        );
        assert_eq!(action_for(EntityKind::Tag, "findOne"), "api::tag.tag.findOne");
    }

    #[test]
    fn entry_serializes_flat() {
        let now = Utc::now();
        let mut attributes = Attributes::new();
        attributes.insert("slug".into(), Value::from("launch"));
        attributes.insert("label".into(), Value::from("Launch"));
        let entry = Entry {
            id: 7,
            kind: EntityKind::Tag,
            attributes,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["slug"], "launch");
        assert_eq!(json["label"], "Launch");
        assert!(json.get("createdAt").is_some());
        assert_eq!(entry.slug(), Some("launch"));
    }
}
