//! Entity service with lifecycle integration.
//!
//! Provides CRUD operations for content entries. Writes dispatch the
//! registered lifecycle hooks, then validate the (possibly mutated) payload
//! against the kind's schema, enforce unique attributes and relation targets,
//! and finally persist through the injected [`ContentStore`].

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::{ContentTypeRegistry, ContentTypeSchema, EntityError, ValidationMode};
use crate::lifecycle::{LifecycleEvent, LifecycleRegistry};
use crate::models::{Attributes, EntityKind, Entry};
use crate::store::{ContentStore, EntryQuery};

/// Service for content CRUD with lifecycle hooks.
///
/// Cheap to clone; clones share the store and registries.
#[derive(Clone)]
pub struct EntityService {
    inner: Arc<EntityServiceInner>,
}

struct EntityServiceInner {
    store: Arc<dyn ContentStore>,
    lifecycles: LifecycleRegistry,
    types: ContentTypeRegistry,
}

impl EntityService {
    /// Create a service over a store with the given hooks.
    pub fn new(store: Arc<dyn ContentStore>, lifecycles: LifecycleRegistry) -> Self {
        Self {
            inner: Arc::new(EntityServiceInner {
                store,
                lifecycles,
                types: ContentTypeRegistry::builtin(),
            }),
        }
    }

    /// Create a service with the built-in hooks.
    pub fn with_defaults(store: Arc<dyn ContentStore>) -> Self {
        Self::new(store, LifecycleRegistry::with_defaults())
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.inner.store
    }

    /// List entries matching a query.
    pub async fn find_many(
        &self,
        kind: EntityKind,
        query: &EntryQuery,
    ) -> Result<Vec<Entry>, EntityError> {
        Ok(self.inner.store.find_many(kind, query).await?)
    }

    /// Load an entry by id.
    pub async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Option<Entry>, EntityError> {
        Ok(self.inner.store.find_one(kind, id).await?)
    }

    /// Count entries of a kind.
    pub async fn count(&self, kind: EntityKind) -> Result<u64, EntityError> {
        Ok(self.inner.store.count(kind).await?)
    }

    /// Create an entry, running `before_create` hooks first.
    pub async fn create(&self, kind: EntityKind, data: Attributes) -> Result<Entry, EntityError> {
        let mut event = LifecycleEvent::before_create(kind, Some(data));
        self.inner.lifecycles.dispatch(&mut event);
        let data = event.params.data.unwrap_or_default();

        let schema = self.inner.types.get(kind);
        schema.validate(&data, ValidationMode::Create)?;
        self.check_unique(schema, &data, None).await?;
        self.check_relations(schema, &data).await?;

        let entry = self.inner.store.create(kind, data).await?;

        info!(kind = %kind, id = entry.id, slug = ?entry.slug(), "entry created");
        Ok(entry)
    }

    /// Update an entry, running `before_update` hooks first.
    pub async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        data: Attributes,
    ) -> Result<Entry, EntityError> {
        if self.inner.store.find_one(kind, id).await?.is_none() {
            return Err(EntityError::NotFound { kind, id });
        }

        let mut event = LifecycleEvent::before_update(kind, id, Some(data));
        self.inner.lifecycles.dispatch(&mut event);
        let data = event.params.data.unwrap_or_default();

        let schema = self.inner.types.get(kind);
        schema.validate(&data, ValidationMode::Update)?;
        self.check_unique(schema, &data, Some(id)).await?;
        self.check_relations(schema, &data).await?;

        let entry = self
            .inner
            .store
            .update(kind, id, data)
            .await?
            .ok_or(EntityError::NotFound { kind, id })?;

        info!(kind = %kind, id, "entry updated");
        Ok(entry)
    }

    /// Delete an entry, returning what was removed.
    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<Entry, EntityError> {
        let entry = self
            .inner
            .store
            .find_one(kind, id)
            .await?
            .ok_or(EntityError::NotFound { kind, id })?;

        if !self.inner.store.delete(kind, id).await? {
            return Err(EntityError::NotFound { kind, id });
        }

        info!(kind = %kind, id, "entry deleted");
        Ok(entry)
    }

    /// Reject values of unique attributes already held by another entry.
    async fn check_unique(
        &self,
        schema: &ContentTypeSchema,
        data: &Attributes,
        exclude: Option<i64>,
    ) -> Result<(), EntityError> {
        for attr in schema.attributes.iter().filter(|a| a.unique) {
            let Some(value) = data.get(&attr.name).filter(|v| !v.is_null()) else {
                continue;
            };

            let query = EntryQuery::new()
                .with_filter(attr.name.clone(), value.clone())
                .with_limit(2);
            let taken = self
                .inner
                .store
                .find_many(schema.kind, &query)
                .await?
                .iter()
                .any(|e| Some(e.id) != exclude);

            if taken {
                return Err(EntityError::Validation {
                    kind: schema.kind,
                    message: format!("'{}' must be unique, {value} is taken", attr.name),
                });
            }
        }

        Ok(())
    }

    /// Reject references to entries that don't exist.
    async fn check_relations(
        &self,
        schema: &ContentTypeSchema,
        data: &Attributes,
    ) -> Result<(), EntityError> {
        for (attr, target) in schema.relations() {
            let ids: Vec<i64> = match data.get(&attr.name) {
                Some(Value::Array(values)) => values.iter().filter_map(Value::as_i64).collect(),
                Some(value) => value.as_i64().into_iter().collect(),
                None => continue,
            };

            for id in ids {
                if self.inner.store.find_one(target, id).await?.is_none() {
                    return Err(EntityError::Validation {
                        kind: schema.kind,
                        message: format!("'{}' references missing {target} {id}", attr.name),
                    });
                }
            }
        }

        Ok(())
    }
}
