//! Permission checking service with DashMap-based caching.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use dashmap::DashMap;
use tracing::debug;

use crate::store::PermissionStore;

/// Permission service with fast DashMap-based lookups.
#[derive(Clone)]
pub struct PermissionService {
    inner: Arc<PermissionServiceInner>,
}

struct PermissionServiceInner {
    /// Cache of role type -> enabled actions.
    role_cache: DashMap<String, HashSet<String>>,

    /// Backing store for cache misses.
    store: Arc<dyn PermissionStore>,
}

impl PermissionService {
    /// Create a new permission service.
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self {
            inner: Arc::new(PermissionServiceInner {
                role_cache: DashMap::new(),
                store,
            }),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.inner.store
    }

    /// Check if a role has an enabled grant for `action`.
    ///
    /// A role that doesn't exist is allowed nothing.
    pub async fn role_allows(&self, role_type: &str, action: &str) -> Result<bool> {
        if let Some(cached) = self.inner.role_cache.get(role_type) {
            return Ok(cached.contains(action));
        }

        let actions = self.load_role_actions(role_type).await?;
        let allowed = actions.contains(action);
        self.inner.role_cache.insert(role_type.to_string(), actions);

        Ok(allowed)
    }

    /// Load the enabled actions of a role from the store.
    async fn load_role_actions(&self, role_type: &str) -> Result<HashSet<String>> {
        let Some(role) = self.inner.store.find_role_by_type(role_type).await? else {
            debug!(role = %role_type, "role not found, granting nothing");
            return Ok(HashSet::new());
        };

        let actions = self
            .inner
            .store
            .role_permissions(role.id)
            .await?
            .into_iter()
            .filter(|p| p.enabled)
            .map(|p| p.action)
            .collect();

        Ok(actions)
    }

    /// Invalidate the entire cache.
    ///
    /// Call this when role permissions change.
    pub fn invalidate_all(&self) {
        self.inner.role_cache.clear();
    }

    /// Get the number of cached entries (for monitoring).
    pub fn cache_size(&self) -> usize {
        self.inner.role_cache.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{CreatePermission, well_known};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn enabled_grants_allow_and_disabled_deny() {
        let store = MemoryStore::new();
        let public = store
            .find_role_by_type(well_known::PUBLIC)
            .await
            .unwrap()
            .unwrap();
        for (action, enabled) in [("api::tag.tag.find", true), ("api::tag.tag.create", false)] {
            store
                .create_permission(CreatePermission {
                    action: action.into(),
                    role_id: public.id,
                    enabled,
                })
                .await
                .unwrap();
        }

        let service = PermissionService::new(Arc::new(store));
        assert!(service.role_allows("public", "api::tag.tag.find").await.unwrap());
        assert!(!service.role_allows("public", "api::tag.tag.create").await.unwrap());
        assert!(!service.role_allows("public", "api::tag.tag.delete").await.unwrap());
        assert_eq!(service.cache_size(), 1);
    }

    #[tokio::test]
    async fn cache_is_refreshed_after_invalidation() {
        let store = MemoryStore::new();
        let service = PermissionService::new(Arc::new(store.clone()));
        assert!(!service.role_allows("public", "api::tag.tag.find").await.unwrap());

        let public = store
            .find_role_by_type(well_known::PUBLIC)
            .await
            .unwrap()
            .unwrap();
        store
            .create_permission(CreatePermission {
                action: "api::tag.tag.find".into(),
                role_id: public.id,
                enabled: true,
            })
            .await
            .unwrap();

        // Still served from cache.
        assert!(!service.role_allows("public", "api::tag.tag.find").await.unwrap());

        service.invalidate_all();
        assert!(service.role_allows("public", "api::tag.tag.find").await.unwrap());
    }

    #[tokio::test]
    async fn missing_role_allows_nothing() {
        let service = PermissionService::new(Arc::new(MemoryStore::without_roles()));
        assert!(!service.role_allows("public", "api::tag.tag.find").await.unwrap());
    }
}
