//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::bootstrap::BootstrapContext;
use crate::config::Config;
use crate::content::EntityService;
use crate::db;
use crate::permissions::PermissionService;
use crate::store::{ContentStore, MemoryStore, PermissionStore, PgStore};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Loaded configuration.
    config: Config,

    /// Content reads and writes, with lifecycle hooks.
    entities: EntityService,

    /// Permission service for access control.
    permissions: PermissionService,
}

impl AppState {
    /// Create application state, connecting to PostgreSQL when configured.
    ///
    /// Without `DATABASE_URL` content lives in process memory and is lost on
    /// restart.
    pub async fn new(config: &Config) -> Result<Self> {
        let Some(database_url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set, using in-memory store");
            return Ok(Self::in_memory(config.clone()));
        };

        let pool = db::create_pool(database_url, config.database_max_connections)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&pool)
            .await
            .context("failed to run migrations")?;

        info!(
            max_connections = config.database_max_connections,
            "connected to PostgreSQL"
        );

        let store = Arc::new(PgStore::new(pool));
        Ok(Self::with_stores(config.clone(), store.clone(), store))
    }

    /// State backed by a fresh [`MemoryStore`].
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    /// State over explicit stores.
    pub fn with_stores(
        config: Config,
        content: Arc<dyn ContentStore>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                entities: EntityService::with_defaults(content),
                permissions: PermissionService::new(permissions),
            }),
        }
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the entity service.
    pub fn entities(&self) -> &EntityService {
        &self.inner.entities
    }

    /// Get the permission service.
    pub fn permissions(&self) -> &PermissionService {
        &self.inner.permissions
    }

    /// Handles for the first-boot bootstrap.
    pub fn bootstrap_context(&self) -> BootstrapContext {
        BootstrapContext {
            entities: self.inner.entities.clone(),
            permissions: self.inner.permissions.clone(),
        }
    }

    /// Name of the content store backend.
    pub fn store_backend(&self) -> &'static str {
        self.inner.entities.store().backend()
    }

    /// Check if the content store answers.
    pub async fn store_healthy(&self) -> bool {
        self.inner.entities.store().ping().await
    }
}
