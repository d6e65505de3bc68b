//! In-process store.
//!
//! Keeps everything in memory behind a single `parking_lot::RwLock`. Used when
//! no database is configured and by the test suites. Ids are assigned per
//! kind starting at 1, like serial columns.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;

use super::{ContentStore, EntryQuery, PermissionStore, json_contains};
use crate::models::role::well_known;
use crate::models::{Attributes, CreatePermission, EntityKind, Entry, Permission, Role};

/// In-memory implementation of [`ContentStore`] and [`PermissionStore`].
///
/// Clones share the same underlying data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<EntityKind, BTreeMap<i64, Entry>>,
    entry_seq: HashMap<EntityKind, i64>,
    roles: Vec<Role>,
    permissions: BTreeMap<i64, Permission>,
    permission_seq: i64,
}

impl MemoryStore {
    /// Create a store holding the built-in `public` and `authenticated` roles.
    pub fn new() -> Self {
        let store = Self::without_roles();
        store.insert_role(
            "Public",
            "Default role given to unauthenticated user.",
            well_known::PUBLIC,
        );
        store.insert_role(
            "Authenticated",
            "Default role given to authenticated user.",
            well_known::AUTHENTICATED,
        );
        store
    }

    /// Create a store with no roles at all.
    pub fn without_roles() -> Self {
        Self::default()
    }

    /// Add a role, returning it with its assigned id.
    pub fn insert_role(&self, name: &str, description: &str, role_type: &str) -> Role {
        let mut state = self.inner.write();
        let role = Role {
            id: state.roles.len() as i64 + 1,
            name: name.to_string(),
            description: Some(description.to_string()),
            role_type: role_type.to_string(),
        };
        state.roles.push(role.clone());
        role
    }

    /// Every stored grant, ordered by id.
    pub fn all_permissions(&self) -> Vec<Permission> {
        self.inner.read().permissions.values().cloned().collect()
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_many(&self, kind: EntityKind, query: &EntryQuery) -> Result<Vec<Entry>> {
        let state = self.inner.read();
        let Some(entries) = state.entries.get(&kind) else {
            return Ok(Vec::new());
        };

        let matched = entries
            .values()
            .filter(|e| {
                query
                    .filters
                    .iter()
                    .all(|(k, ev)| e.attributes.get(k).is_some_and(|av| json_contains(av, ev)))
            })
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(matched)
    }

    async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Option<Entry>> {
        let state = self.inner.read();
        Ok(state.entries.get(&kind).and_then(|m| m.get(&id)).cloned())
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let state = self.inner.read();
        Ok(state.entries.get(&kind).map_or(0, |m| m.len() as u64))
    }

    async fn create(&self, kind: EntityKind, attributes: Attributes) -> Result<Entry> {
        let mut state = self.inner.write();

        if let Some(slug) = attributes.get("slug").and_then(Value::as_str) {
            let taken = state
                .entries
                .get(&kind)
                .is_some_and(|m| m.values().any(|e| e.slug() == Some(slug)));
            if taken {
                bail!("duplicate {kind} slug '{slug}'");
            }
        }

        let seq = state.entry_seq.entry(kind).or_insert(0);
        *seq += 1;
        let id = *seq;

        let now = Utc::now();
        let entry = Entry {
            id,
            kind,
            attributes,
            created_at: now,
            updated_at: now,
        };
        state.entries.entry(kind).or_default().insert(id, entry.clone());

        Ok(entry)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        attributes: Attributes,
    ) -> Result<Option<Entry>> {
        let mut state = self.inner.write();
        let Some(entry) = state.entries.get_mut(&kind).and_then(|m| m.get_mut(&id)) else {
            return Ok(None);
        };

        entry.attributes.extend(attributes);
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let mut state = self.inner.write();
        Ok(state
            .entries
            .get_mut(&kind)
            .is_some_and(|m| m.remove(&id).is_some()))
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn find_role_by_type(&self, role_type: &str) -> Result<Option<Role>> {
        let state = self.inner.read();
        Ok(state.roles.iter().find(|r| r.role_type == role_type).cloned())
    }

    async fn find_permission(&self, action: &str, role_id: i64) -> Result<Option<Permission>> {
        let state = self.inner.read();
        Ok(state
            .permissions
            .values()
            .find(|p| p.action == action && p.role_id == role_id)
            .cloned())
    }

    async fn set_permission_enabled(&self, id: i64, enabled: bool) -> Result<Option<Permission>> {
        let mut state = self.inner.write();
        let Some(permission) = state.permissions.get_mut(&id) else {
            return Ok(None);
        };

        permission.enabled = enabled;
        permission.updated_at = Utc::now();
        Ok(Some(permission.clone()))
    }

    async fn create_permission(&self, input: CreatePermission) -> Result<Permission> {
        let mut state = self.inner.write();
        if !state.roles.iter().any(|r| r.id == input.role_id) {
            bail!("role {} does not exist", input.role_id);
        }

        state.permission_seq += 1;
        let now = Utc::now();
        let permission = Permission {
            id: state.permission_seq,
            action: input.action,
            role_id: input.role_id,
            enabled: input.enabled,
            created_at: now,
            updated_at: now,
        };
        state.permissions.insert(permission.id, permission.clone());

        Ok(permission)
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<Permission>> {
        let state = self.inner.read();
        Ok(state
            .permissions
            .values()
            .filter(|p| p.role_id == role_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_per_kind() {
        let store = MemoryStore::new();
        let a = store
            .create(EntityKind::Tag, attrs(json!({"label": "A", "slug": "a"})))
            .await
            .unwrap();
        let b = store
            .create(EntityKind::Tag, attrs(json!({"label": "B", "slug": "b"})))
            .await
            .unwrap();
        let c = store
            .create(EntityKind::Category, attrs(json!({"name": "C", "slug": "c"})))
            .await
            .unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 1));
        assert_eq!(store.count(EntityKind::Tag).await.unwrap(), 2);
        assert_eq!(store.count(EntityKind::BlogPost).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let store = MemoryStore::new();
        store
            .create(EntityKind::Tag, attrs(json!({"slug": "a"})))
            .await
            .unwrap();
        let err = store
            .create(EntityKind::Tag, attrs(json!({"slug": "a"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("duplicate tag slug"));
    }

    #[tokio::test]
    async fn find_many_filters_and_paginates() {
        let store = MemoryStore::new();
        for (slug, featured) in [("one", true), ("two", false), ("three", true)] {
            store
                .create(
                    EntityKind::BlogPost,
                    attrs(json!({"slug": slug, "featured": featured})),
                )
                .await
                .unwrap();
        }

        let featured = store
            .find_many(
                EntityKind::BlogPost,
                &EntryQuery::new().with_filter("featured", true),
            )
            .await
            .unwrap();
        let slugs: Vec<_> = featured.iter().filter_map(Entry::slug).collect();
        assert_eq!(slugs, vec!["one", "three"]);

        let page = store
            .find_many(
                EntityKind::BlogPost,
                &EntryQuery::new().with_offset(1).with_limit(1),
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].slug(), Some("two"));
    }

    #[tokio::test]
    async fn update_merges_and_delete_removes() {
        let store = MemoryStore::new();
        let tag = store
            .create(EntityKind::Tag, attrs(json!({"label": "Old", "slug": "s"})))
            .await
            .unwrap();

        let updated = store
            .update(EntityKind::Tag, tag.id, attrs(json!({"label": "New"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.attributes["label"], "New");
        assert_eq!(updated.attributes["slug"], "s");

        assert!(store.delete(EntityKind::Tag, tag.id).await.unwrap());
        assert!(!store.delete(EntityKind::Tag, tag.id).await.unwrap());
        assert!(
            store
                .update(EntityKind::Tag, tag.id, Attributes::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn permission_round_trip() {
        let store = MemoryStore::new();
        let public = store
            .find_role_by_type(well_known::PUBLIC)
            .await
            .unwrap()
            .unwrap();

        let created = store
            .create_permission(CreatePermission {
                action: "api::tag.tag.find".into(),
                role_id: public.id,
                enabled: false,
            })
            .await
            .unwrap();

        let found = store
            .find_permission("api::tag.tag.find", public.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        let enabled = store
            .set_permission_enabled(created.id, true)
            .await
            .unwrap()
            .unwrap();
        assert!(enabled.enabled);
        assert_eq!(store.role_permissions(public.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn roles_can_be_absent() {
        let store = MemoryStore::without_roles();
        assert!(store.find_role_by_type(well_known::PUBLIC).await.unwrap().is_none());
        assert!(
            store
                .create_permission(CreatePermission {
                    action: "api::tag.tag.find".into(),
                    role_id: 1,
                    enabled: true,
                })
                .await
                .is_err()
        );
    }
}
