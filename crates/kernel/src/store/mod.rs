//! Data-access layer.
//!
//! Two traits cover everything the rest of the kernel persists:
//! [`ContentStore`] for content entries and [`PermissionStore`] for roles and
//! permission grants. Callers receive them as `Arc<dyn ...>` handles so the
//! bootstrap and write paths can run against PostgreSQL ([`PgStore`]) or the
//! in-process [`MemoryStore`].
//!
//! # Usage
//!
//! ```ignore
//! let query = EntryQuery::new().with_filter("slug", "launch").with_limit(1);
//! let tags = store.find_many(EntityKind::Tag, &query).await?;
//! ```

mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{Attributes, CreatePermission, EntityKind, Entry, Permission, Role};

/// Query criteria for listing entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQuery {
    /// Attribute values the entry must contain (see [`json_contains`]).
    pub filters: Attributes,

    /// Maximum number of results.
    pub limit: Option<usize>,

    /// Number of results to skip.
    pub offset: Option<usize>,
}

impl EntryQuery {
    /// Create an empty query matching everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an attribute value.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Replace all filters.
    pub fn with_filters(mut self, filters: Attributes) -> Self {
        self.filters = filters;
        self
    }

    /// Limit results.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Storage for content entries.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// List entries of a kind matching the query, ordered by id.
    async fn find_many(&self, kind: EntityKind, query: &EntryQuery) -> Result<Vec<Entry>>;

    /// Load a single entry by id.
    async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Option<Entry>>;

    /// Count all entries of a kind.
    async fn count(&self, kind: EntityKind) -> Result<u64>;

    /// Persist a new entry, assigning its id and timestamps.
    async fn create(&self, kind: EntityKind, attributes: Attributes) -> Result<Entry>;

    /// Merge `attributes` over a stored entry.
    ///
    /// Returns `None` if the entry doesn't exist.
    async fn update(&self, kind: EntityKind, id: i64, attributes: Attributes)
    -> Result<Option<Entry>>;

    /// Delete an entry.
    ///
    /// Returns `true` if an entry was deleted, `false` if it didn't exist.
    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool>;

    /// Short name of the backing storage, reported by `/health`.
    fn backend(&self) -> &'static str;

    /// Check that the backing storage answers.
    async fn ping(&self) -> bool {
        true
    }
}

/// Storage for roles and their permission grants.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Find a role by its machine type (`public`, `authenticated`).
    async fn find_role_by_type(&self, role_type: &str) -> Result<Option<Role>>;

    /// Find the grant of `action` to a role.
    async fn find_permission(&self, action: &str, role_id: i64) -> Result<Option<Permission>>;

    /// Set the `enabled` flag of a grant by id.
    ///
    /// Returns `None` if the grant doesn't exist.
    async fn set_permission_enabled(&self, id: i64, enabled: bool) -> Result<Option<Permission>>;

    /// Insert a new grant.
    async fn create_permission(&self, input: CreatePermission) -> Result<Permission>;

    /// All grants of a role.
    async fn role_permissions(&self, role_id: i64) -> Result<Vec<Permission>>;
}

/// JSON containment, matching PostgreSQL's `jsonb @>`.
///
/// Objects contain another object when every key of `expected` is contained
/// in the corresponding value of `actual`. Arrays contain another array when
/// every element of `expected` is contained in some element of `actual`.
/// Scalars compare equal.
pub fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => e
            .iter()
            .all(|(k, ev)| a.get(k).is_some_and(|av| json_contains(av, ev))),
        (Value::Array(a), Value::Array(e)) => {
            e.iter().all(|ev| a.iter().any(|av| json_contains(av, ev)))
        }
        (a, e) => a == e,
    }
}
