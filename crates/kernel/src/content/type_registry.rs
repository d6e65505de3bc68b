//! Content type registry.
//!
//! Describes the attributes each content kind accepts and validates write
//! payloads against them.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::EntityError;
use crate::models::{Attributes, EntityKind};

#[allow(clippy::expect_used)]
static UID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_.~]+$").expect("valid regex literal"));

/// The value type an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum AttributeType {
    String,
    Text,
    RichText,
    /// URL-safe identifier (`[A-Za-z0-9-_.~]+`).
    Uid,
    Boolean,
    Integer,
    /// RFC 3339 timestamp.
    DateTime,
    /// Reference to entries of another kind, stored as ids.
    Relation { target: EntityKind, many: bool },
}

/// A single attribute within a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeDefinition {
    pub name: String,
    pub attribute_type: AttributeType,
    pub required: bool,
    pub unique: bool,
    /// Inclusive lower bound for integers.
    pub min: Option<i64>,
}

impl AttributeDefinition {
    pub fn new(name: &str, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            required: false,
            unique: false,
            min: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    /// Check a present value against this attribute's type.
    fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return if self.required {
                Err(format!("'{}' must not be null", self.name))
            } else {
                Ok(())
            };
        }

        match self.attribute_type {
            AttributeType::String | AttributeType::Text | AttributeType::RichText => {
                if !value.is_string() {
                    return Err(format!("'{}' must be a string", self.name));
                }
            }
            AttributeType::Uid => match value.as_str() {
                Some(s) if UID_PATTERN.is_match(s) => {}
                _ => {
                    return Err(format!(
                        "'{}' must be a URL-safe string of letters, digits, '-', '_', '.' or '~'",
                        self.name
                    ));
                }
            },
            AttributeType::Boolean => {
                if !value.is_boolean() {
                    return Err(format!("'{}' must be a boolean", self.name));
                }
            }
            AttributeType::Integer => {
                let Some(n) = value.as_i64() else {
                    return Err(format!("'{}' must be an integer", self.name));
                };
                if let Some(min) = self.min {
                    if n < min {
                        return Err(format!("'{}' must be at least {min}", self.name));
                    }
                }
            }
            AttributeType::DateTime => {
                let valid = value
                    .as_str()
                    .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
                if !valid {
                    return Err(format!("'{}' must be an RFC 3339 timestamp", self.name));
                }
            }
            AttributeType::Relation { many: false, .. } => {
                if value.as_i64().is_none() {
                    return Err(format!("'{}' must be an entry id", self.name));
                }
            }
            AttributeType::Relation { many: true, .. } => {
                let valid = value
                    .as_array()
                    .is_some_and(|ids| ids.iter().all(|id| id.as_i64().is_some()));
                if !valid {
                    return Err(format!("'{}' must be a list of entry ids", self.name));
                }
            }
        }

        Ok(())
    }
}

/// Whether a payload replaces a whole entry or patches part of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    Create,
    Update,
}

/// Attributes accepted by one content kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentTypeSchema {
    pub kind: EntityKind,
    pub display_name: String,
    pub attributes: Vec<AttributeDefinition>,
}

impl ContentTypeSchema {
    /// Built-in schema for a kind.
    pub fn for_kind(kind: EntityKind) -> Self {
        use AttributeType as T;

        let (display_name, attributes) = match kind {
            EntityKind::Category => (
                "Category",
                vec![
                    AttributeDefinition::new("name", T::String).required(),
                    AttributeDefinition::new("slug", T::Uid).required().unique(),
                    AttributeDefinition::new("description", T::Text),
                ],
            ),
            EntityKind::Tag => (
                "Tag",
                vec![
                    AttributeDefinition::new("label", T::String).required(),
                    AttributeDefinition::new("slug", T::Uid).required().unique(),
                ],
            ),
            EntityKind::BlogPost => (
                "Blog Post",
                vec![
                    AttributeDefinition::new("title", T::String).required(),
                    AttributeDefinition::new("slug", T::Uid).required().unique(),
                    AttributeDefinition::new("excerpt", T::Text),
                    AttributeDefinition::new("content", T::RichText),
                    AttributeDefinition::new(
                        "category",
                        T::Relation {
                            target: EntityKind::Category,
                            many: false,
                        },
                    ),
                    AttributeDefinition::new(
                        "tags",
                        T::Relation {
                            target: EntityKind::Tag,
                            many: true,
                        },
                    ),
                    AttributeDefinition::new("featured", T::Boolean),
                    AttributeDefinition::new("readTime", T::Integer).min(1),
                    AttributeDefinition::new("publishedAt", T::DateTime),
                ],
            ),
        };

        Self {
            kind,
            display_name: display_name.to_string(),
            attributes,
        }
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Attributes holding references to other kinds.
    pub fn relations(&self) -> impl Iterator<Item = (&AttributeDefinition, EntityKind)> {
        self.attributes.iter().filter_map(|a| match a.attribute_type {
            AttributeType::Relation { target, .. } => Some((a, target)),
            _ => None,
        })
    }

    /// Validate a write payload.
    ///
    /// Rejects unknown attributes and type mismatches. In
    /// [`ValidationMode::Create`] every required attribute must be present
    /// and non-empty.
    pub fn validate(&self, data: &Attributes, mode: ValidationMode) -> Result<(), EntityError> {
        let mut problems = Vec::new();

        for (name, value) in data {
            match self.attribute(name) {
                Some(attr) => {
                    if let Err(problem) = attr.check(value) {
                        problems.push(problem);
                    }
                }
                None => problems.push(format!("unknown attribute '{name}'")),
            }
        }

        if mode == ValidationMode::Create {
            for attr in self.attributes.iter().filter(|a| a.required) {
                let missing = match data.get(&attr.name) {
                    None | Some(Value::Null) => true,
                    Some(Value::String(s)) => s.trim().is_empty(),
                    Some(_) => false,
                };
                if missing && !problems.iter().any(|p| p.contains(&format!("'{}'", attr.name))) {
                    problems.push(format!("'{}' is required", attr.name));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EntityError::Validation {
                kind: self.kind,
                message: problems.join("; "),
            })
        }
    }
}

/// Registry of content type schemas.
#[derive(Debug, Clone)]
pub struct ContentTypeRegistry {
    category: ContentTypeSchema,
    tag: ContentTypeSchema,
    blog_post: ContentTypeSchema,
}

impl ContentTypeRegistry {
    /// Registry holding the built-in schemas of every kind.
    pub fn builtin() -> Self {
        Self {
            category: ContentTypeSchema::for_kind(EntityKind::Category),
            tag: ContentTypeSchema::for_kind(EntityKind::Tag),
            blog_post: ContentTypeSchema::for_kind(EntityKind::BlogPost),
        }
    }

    /// Get the schema of a kind.
    pub fn get(&self, kind: EntityKind) -> &ContentTypeSchema {
        match kind {
            EntityKind::Category => &self.category,
            EntityKind::Tag => &self.tag,
            EntityKind::BlogPost => &self.blog_post,
        }
    }
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
