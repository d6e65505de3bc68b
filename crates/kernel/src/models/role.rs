//! Role model.

use serde::{Deserialize, Serialize};

/// Well-known role types.
pub mod well_known {
    /// Role applied to unauthenticated API requests.
    pub const PUBLIC: &str = "public";

    /// Role for logged-in end users. Created by migration; nothing grants it
    /// permissions yet.
    pub const AUTHENTICATED: &str = "authenticated";
}

/// Role record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,

    /// Stable machine type (`public`, `authenticated`).
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub role_type: String,
}
