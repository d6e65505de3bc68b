//! Lifecycle registry - indexes which hooks run for which content kind.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Lifecycle, LifecycleAction, LifecycleEvent, ReadTimeLifecycle};
use crate::models::EntityKind;

/// Registry mapping content kinds to ordered hooks.
#[derive(Clone, Default)]
pub struct LifecycleRegistry {
    handlers: HashMap<EntityKind, Vec<Arc<dyn Lifecycle>>>,
}

impl LifecycleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in hooks: read-time estimation on blog posts.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EntityKind::BlogPost, Arc::new(ReadTimeLifecycle));
        registry
    }

    /// Append a hook for a kind. Hooks run in registration order.
    pub fn register(&mut self, kind: EntityKind, handler: Arc<dyn Lifecycle>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Hooks registered for a kind.
    ///
    /// Returns an empty slice if none are registered.
    pub fn handlers(&self, kind: EntityKind) -> &[Arc<dyn Lifecycle>] {
        self.handlers.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Run every hook registered for the event's kind.
    pub fn dispatch(&self, event: &mut LifecycleEvent) {
        let handlers = self.handlers(event.kind);
        if handlers.is_empty() {
            return;
        }

        for handler in handlers {
            match event.action {
                LifecycleAction::BeforeCreate => handler.before_create(event),
                LifecycleAction::BeforeUpdate => handler.before_update(event),
            }
        }

        debug!(
            kind = %event.kind,
            action = ?event.action,
            handlers = handlers.len(),
            "lifecycle dispatch complete"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Attributes;
    use serde_json::Value;

    struct Stamp(&'static str);

    impl Lifecycle for Stamp {
        fn name(&self) -> &'static str {
            self.0
        }

        fn before_create(&self, event: &mut LifecycleEvent) {
            if let Some(data) = event.params.data.as_mut() {
                let trail = data
                    .get("trail")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                data.insert("trail".into(), Value::from(format!("{trail}{}", self.0)));
            }
        }
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let mut registry = LifecycleRegistry::new();
        registry.register(EntityKind::Tag, Arc::new(Stamp("a")));
        registry.register(EntityKind::Tag, Arc::new(Stamp("b")));

        let mut event = LifecycleEvent::before_create(EntityKind::Tag, Some(Attributes::new()));
        registry.dispatch(&mut event);

        assert_eq!(event.params.data.unwrap()["trail"], "ab");
    }

    #[test]
    fn hooks_are_scoped_to_their_kind() {
        let mut registry = LifecycleRegistry::new();
        registry.register(EntityKind::Tag, Arc::new(Stamp("a")));

        let mut event = LifecycleEvent::before_create(EntityKind::Category, Some(Attributes::new()));
        registry.dispatch(&mut event);

        assert!(event.params.data.unwrap().is_empty());
        assert!(registry.handlers(EntityKind::Category).is_empty());
    }

    #[test]
    fn defaults_cover_blog_posts() {
        let registry = LifecycleRegistry::with_defaults();
        let names: Vec<_> = registry
            .handlers(EntityKind::BlogPost)
            .iter()
            .map(|h| h.name())
            .collect();
        assert_eq!(names, vec!["read-time"]);
    }
}
