//! First-boot bootstrap.
//!
//! Runs once per process start, before the server accepts requests:
//! 1. Seed categories, tags and blog posts, unless any blog post exists.
//! 2. Grant the public role read access to the three content collections.
//!
//! Both steps are safe to repeat. A post seed that references a missing
//! category, or none of whose tags exist, aborts the whole bootstrap.

mod content;
mod permissions;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::content::{EntityError, EntityService};
use crate::models::SeedData;
use crate::permissions::PermissionService;

pub use content::{SeedOutcome, ensure_seed, seed_content};
pub use permissions::{PUBLIC_READ_ACTIONS, PermissionOutcome, set_public_permissions};

/// Errors that abort the bootstrap.
#[derive(Debug, Error)]
pub enum SeedError {
    /// A post seed names a category that is neither seeded nor stored.
    #[error("post '{post}' references missing seed category '{slug}'")]
    MissingCategory { post: String, slug: String },

    /// None of a post seed's tags resolved.
    #[error("missing tags for post seed '{post}': {}", .slugs.join(", "))]
    MissingTags { post: String, slugs: Vec<String> },

    /// Writing seed content failed.
    #[error("seed write failed: {0}")]
    Entity(#[from] EntityError),

    /// The permission store failed.
    #[error("permission setup failed: {0}")]
    Store(#[from] anyhow::Error),
}

/// Handles the bootstrap works through.
#[derive(Clone)]
pub struct BootstrapContext {
    pub entities: EntityService,
    pub permissions: PermissionService,
}

/// What a bootstrap run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub content: SeedOutcome,
    pub permissions: PermissionOutcome,
}

/// Run the bootstrap: content seeding, then public permissions.
pub async fn run(ctx: &BootstrapContext, seed: &SeedData) -> Result<BootstrapReport, SeedError> {
    let content = seed_content(&ctx.entities, seed).await?;
    let permissions = set_public_permissions(ctx.permissions.store().as_ref()).await?;
    ctx.permissions.invalidate_all();

    info!(content = ?content, permissions = ?permissions, "bootstrap complete");
    Ok(BootstrapReport {
        content,
        permissions,
    })
}
