//! Lifecycle hooks for content writes.
//!
//! Hooks are registered per content kind and run synchronously, in
//! registration order, before a create or update is validated and persisted.
//! They may mutate the in-flight payload and nothing else.

mod read_time;
mod registry;

use serde_json::Value;

use crate::models::{Attributes, EntityKind};

pub use read_time::{ReadTimeLifecycle, WORDS_PER_MINUTE, compute_read_time, count_words, strip_html};
pub use registry::LifecycleRegistry;

/// The write about to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    BeforeCreate,
    BeforeUpdate,
}

/// Parameters of the intercepted write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventParams {
    /// Payload being written. `None` when the write carries no data.
    pub data: Option<Attributes>,

    /// Target entry id (updates only).
    pub id: Option<i64>,
}

/// An intercepted write, handed to each hook in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub action: LifecycleAction,
    pub kind: EntityKind,
    pub params: EventParams,
}

impl LifecycleEvent {
    /// Event for a create carrying `data`.
    pub fn before_create(kind: EntityKind, data: Option<Attributes>) -> Self {
        Self {
            action: LifecycleAction::BeforeCreate,
            kind,
            params: EventParams { data, id: None },
        }
    }

    /// Event for an update of entry `id` carrying `data`.
    pub fn before_update(kind: EntityKind, id: i64, data: Option<Attributes>) -> Self {
        Self {
            action: LifecycleAction::BeforeUpdate,
            kind,
            params: EventParams { data, id: Some(id) },
        }
    }
}

/// A hook into content writes.
///
/// Both methods default to doing nothing. Hooks must not fail: anything they
/// cannot handle is left untouched for validation to report.
pub trait Lifecycle: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Called before a new entry is persisted.
    fn before_create(&self, _event: &mut LifecycleEvent) {}

    /// Called before an existing entry is updated.
    fn before_update(&self, _event: &mut LifecycleEvent) {}
}

/// Truthiness of a payload value: `null`, `false`, `0`, `""` and absent are
/// falsy, everything else is truthy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}
