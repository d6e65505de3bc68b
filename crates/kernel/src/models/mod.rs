//! Data models.

pub mod entry;
pub mod permission;
pub mod role;
pub mod seed;

pub use entry::{Attributes, EntityKind, Entry, action_for};
pub use permission::{CreatePermission, Permission};
pub use role::{Role, well_known};
pub use seed::{BlogPostSeed, CategorySeed, SeedData, TagSeed};
