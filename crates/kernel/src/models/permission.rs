//! Permission grant model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grant of one action to one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    pub id: i64,

    /// Action identifier, e.g. `api::blog-post.blog-post.find`.
    pub action: String,

    pub role_id: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a permission grant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatePermission {
    pub action: String,
    pub role_id: i64,
    pub enabled: bool,
}
