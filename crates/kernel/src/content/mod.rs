//! Content system.
//!
//! This module provides:
//! - Content type schemas and payload validation
//! - The entity service: the single write path for content, running
//!   lifecycle hooks before anything is persisted

mod entity_service;
mod type_registry;

use thiserror::Error;

use crate::models::EntityKind;

pub use entity_service::EntityService;
pub use type_registry::{
    AttributeDefinition, AttributeType, ContentTypeRegistry, ContentTypeSchema, ValidationMode,
};

/// Errors from content reads and writes.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The payload does not satisfy the kind's schema.
    #[error("invalid {kind} payload: {message}")]
    Validation { kind: EntityKind, message: String },

    /// The target entry does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// The store failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
