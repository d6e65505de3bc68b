//! Public read permissions.

use anyhow::{Context, Result};
use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::models::{CreatePermission, Permission, well_known};
use crate::store::PermissionStore;

/// Actions the public role must be able to perform.
pub const PUBLIC_READ_ACTIONS: [&str; 6] = [
    "api::blog-post.blog-post.find",
    "api::blog-post.blog-post.findOne",
    "api::category.category.find",
    "api::category.category.findOne",
    "api::tag.tag.find",
    "api::tag.tag.findOne",
];

/// Result of the permission step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PermissionOutcome {
    /// No public role exists; nothing was written.
    RoleMissing,

    /// Every read action is granted. `enabled` counts pre-existing grants
    /// that were switched on (or confirmed on).
    Applied { created: usize, enabled: usize },
}

enum Grant {
    Created,
    Enabled,
}

/// Ensure the public role holds an enabled grant for every
/// [`PUBLIC_READ_ACTIONS`] entry.
///
/// Existing grants are updated in place, so repeated runs never duplicate
/// rows. A missing public role is not an error.
pub async fn set_public_permissions(store: &dyn PermissionStore) -> Result<PermissionOutcome> {
    let Some(public) = store
        .find_role_by_type(well_known::PUBLIC)
        .await
        .context("failed to look up public role")?
    else {
        warn!("public role not found, skipping permission setup");
        return Ok(PermissionOutcome::RoleMissing);
    };

    let grants = try_join_all(
        PUBLIC_READ_ACTIONS
            .iter()
            .map(|action| grant(store, action, public.id)),
    )
    .await?;

    let created = grants.iter().filter(|g| matches!(g, Grant::Created)).count();
    let enabled = grants.len() - created;

    info!(role_id = public.id, created, enabled, "public read permissions applied");
    Ok(PermissionOutcome::Applied { created, enabled })
}

async fn grant(store: &dyn PermissionStore, action: &str, role_id: i64) -> Result<Grant> {
    let existing: Option<Permission> = store
        .find_permission(action, role_id)
        .await
        .with_context(|| format!("failed to look up permission {action}"))?;

    if let Some(permission) = existing {
        store
            .set_permission_enabled(permission.id, true)
            .await
            .with_context(|| format!("failed to enable permission {action}"))?;
        debug!(action, id = permission.id, "permission enabled");
        return Ok(Grant::Enabled);
    }

    let permission = store
        .create_permission(CreatePermission {
            action: action.to_string(),
            role_id,
            enabled: true,
        })
        .await
        .with_context(|| format!("failed to create permission {action}"))?;
    debug!(action, id = permission.id, "permission created");
    Ok(Grant::Created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn grants_every_read_action() {
        let store = MemoryStore::new();
        let outcome = set_public_permissions(&store).await.unwrap();
        assert_eq!(
            outcome,
            PermissionOutcome::Applied {
                created: 6,
                enabled: 0
            }
        );

        let public = store
            .find_role_by_type(well_known::PUBLIC)
            .await
            .unwrap()
            .unwrap();
        let mut actions: Vec<String> = store
            .role_permissions(public.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.enabled)
            .map(|p| p.action)
            .collect();
        actions.sort();
        let mut expected: Vec<String> = PUBLIC_READ_ACTIONS.iter().map(|a| a.to_string()).collect();
        expected.sort();
        assert_eq!(actions, expected);
    }

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let store = MemoryStore::new();
        set_public_permissions(&store).await.unwrap();
        let outcome = set_public_permissions(&store).await.unwrap();

        assert_eq!(
            outcome,
            PermissionOutcome::Applied {
                created: 0,
                enabled: 6
            }
        );
        assert_eq!(store.all_permissions().len(), 6);
    }

    #[tokio::test]
    async fn disabled_grant_is_switched_on() {
        let store = MemoryStore::new();
        let public = store
            .find_role_by_type(well_known::PUBLIC)
            .await
            .unwrap()
            .unwrap();
        store
            .create_permission(CreatePermission {
                action: "api::tag.tag.find".into(),
                role_id: public.id,
                enabled: false,
            })
            .await
            .unwrap();

        let outcome = set_public_permissions(&store).await.unwrap();
        assert_eq!(
            outcome,
            PermissionOutcome::Applied {
                created: 5,
                enabled: 1
            }
        );

        let grant = store
            .find_permission("api::tag.tag.find", public.id)
            .await
            .unwrap()
            .unwrap();
        assert!(grant.enabled);
        assert_eq!(store.all_permissions().len(), 6);
    }

    #[tokio::test]
    async fn other_roles_are_untouched() {
        let store = MemoryStore::new();
        set_public_permissions(&store).await.unwrap();

        let authenticated = store
            .find_role_by_type(well_known::AUTHENTICATED)
            .await
            .unwrap()
            .unwrap();
        assert!(
            store
                .role_permissions(authenticated.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn missing_public_role_is_a_no_op() {
        let store = MemoryStore::without_roles();
        let outcome = set_public_permissions(&store).await.unwrap();

        assert_eq!(outcome, PermissionOutcome::RoleMissing);
        assert!(store.all_permissions().is_empty());
    }
}
