//! PostgreSQL store.
//!
//! Entries of every kind share the `entries` table: a `kind` discriminator and
//! a JSONB `attributes` column. Filters use JSONB containment (`@>`), so
//! [`super::json_contains`] defines the same semantics for the memory store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use super::{ContentStore, EntryQuery, PermissionStore};
use crate::models::{Attributes, CreatePermission, EntityKind, Entry, Permission, Role};

/// PostgreSQL implementation of [`ContentStore`] and [`PermissionStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Raw `entries` row.
#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    kind: String,
    attributes: sqlx::types::Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for Entry {
    type Error = anyhow::Error;

    fn try_from(row: EntryRow) -> Result<Self> {
        let attributes = match row.attributes.0 {
            Value::Object(map) => map,
            other => anyhow::bail!("entry {} has non-object attributes: {other}", row.id),
        };

        Ok(Entry {
            id: row.id,
            kind: row.kind.parse()?,
            attributes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ENTRY_COLUMNS: &str = "id, kind, attributes, created_at, updated_at";
const PERMISSION_COLUMNS: &str = "id, action, role_id, enabled, created_at, updated_at";

impl PgStore {
    /// Create a store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn find_many(&self, kind: EntityKind, query: &EntryQuery) -> Result<Vec<Entry>> {
        // LIMIT NULL means no limit in PostgreSQL.
        let limit = query
            .limit
            .map(i64::try_from)
            .transpose()
            .context("limit out of range")?;
        let offset = i64::try_from(query.offset.unwrap_or(0)).context("offset out of range")?;

        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS} FROM entries
            WHERE kind = $1 AND attributes @> $2
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(kind.singular())
        .bind(sqlx::types::Json(Value::Object(query.filters.clone())))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list {kind} entries"))?;

        rows.into_iter().map(Entry::try_from).collect()
    }

    async fn find_one(&self, kind: EntityKind, id: i64) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE kind = $1 AND id = $2"
        ))
        .bind(kind.singular())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to fetch {kind} entry"))?;

        row.map(Entry::try_from).transpose()
    }

    async fn count(&self, kind: EntityKind) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM entries WHERE kind = $1")
            .bind(kind.singular())
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to count {kind} entries"))?;

        Ok(count.max(0) as u64)
    }

    async fn create(&self, kind: EntityKind, attributes: Attributes) -> Result<Entry> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "INSERT INTO entries (kind, attributes) VALUES ($1, $2) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(kind.singular())
        .bind(sqlx::types::Json(Value::Object(attributes)))
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create {kind} entry"))?;

        Entry::try_from(row)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: i64,
        attributes: Attributes,
    ) -> Result<Option<Entry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            UPDATE entries
            SET attributes = attributes || $3, updated_at = NOW()
            WHERE kind = $1 AND id = $2
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(kind.singular())
        .bind(id)
        .bind(sqlx::types::Json(Value::Object(attributes)))
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update {kind} entry"))?;

        row.map(Entry::try_from).transpose()
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE kind = $1 AND id = $2")
            .bind(kind.singular())
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete {kind} entry"))?;

        Ok(result.rows_affected() > 0)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> bool {
        crate::db::check_health(&self.pool).await
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn find_role_by_type(&self, role_type: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, description, type FROM roles WHERE type = $1",
        )
        .bind(role_type)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch role by type")?;

        Ok(role)
    }

    async fn find_permission(&self, action: &str, role_id: i64) -> Result<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE action = $1 AND role_id = $2"
        ))
        .bind(action)
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to fetch permission")?;

        Ok(permission)
    }

    async fn set_permission_enabled(&self, id: i64, enabled: bool) -> Result<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            r#"
            UPDATE permissions SET enabled = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {PERMISSION_COLUMNS}
            "#
        ))
        .bind(enabled)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update permission")?;

        Ok(permission)
    }

    async fn create_permission(&self, input: CreatePermission) -> Result<Permission> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            r#"
            INSERT INTO permissions (action, role_id, enabled)
            VALUES ($1, $2, $3)
            RETURNING {PERMISSION_COLUMNS}
            "#
        ))
        .bind(&input.action)
        .bind(input.role_id)
        .bind(input.enabled)
        .fetch_one(&self.pool)
        .await
        .context("failed to create permission")?;

        Ok(permission)
    }

    async fn role_permissions(&self, role_id: i64) -> Result<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE role_id = $1 ORDER BY id"
        ))
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list role permissions")?;

        Ok(permissions)
    }
}
