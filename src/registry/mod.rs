//! Model registry
//!
//! Resolves which entity type an audit entry is about, and which store can
//! update records of that type. Stores are registered explicitly at startup,
//! one per entity type.

mod classifier;
mod delegate;

pub use classifier::{default_rules, ActionClassifier, ClassificationRule};
pub use delegate::EntityStore;

use std::collections::HashMap;
use std::sync::Arc;

use crate::audit::AuditLogEntry;
use crate::models::EntityType;

/// Action classifier plus the registered entity stores
pub struct ModelRegistry {
    classifier: ActionClassifier,
    delegates: HashMap<EntityType, Arc<dyn EntityStore>>,
}

impl ModelRegistry {
    /// Create an empty registry using the given classifier
    pub fn new(classifier: ActionClassifier) -> Self {
        Self {
            classifier,
            delegates: HashMap::new(),
        }
    }

    /// Register the store for its entity type, replacing any previous one
    pub fn register(&mut self, store: Arc<dyn EntityStore>) {
        let entity_type = store.entity_type();
        if self.delegates.insert(entity_type, store).is_some() {
            tracing::warn!(%entity_type, "Replacing previously registered entity store");
        }
    }

    /// Builder-style `register`
    pub fn with_store(mut self, store: Arc<dyn EntityStore>) -> Self {
        self.register(store);
        self
    }

    /// Classify an action tag
    pub fn resolve_entity_type(&self, action: &str) -> Option<EntityType> {
        self.classifier.classify(action)
    }

    /// Entity type of an entry: the recorded one if present, else its action's
    pub fn resolve_for_entry(&self, entry: &AuditLogEntry) -> Option<EntityType> {
        entry
            .entity_type
            .or_else(|| self.resolve_entity_type(&entry.action))
    }

    /// The store registered for an entity type
    pub fn resolve_delegate(&self, entity_type: EntityType) -> Option<Arc<dyn EntityStore>> {
        self.delegates.get(&entity_type).cloned()
    }

    /// Entity types that have a registered store
    pub fn registered_types(&self) -> Vec<EntityType> {
        let mut types: Vec<EntityType> = self.delegates.keys().copied().collect();
        types.sort();
        types
    }

    pub fn classifier(&self) -> &ActionClassifier {
        &self.classifier
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new(ActionClassifier::default())
    }
}
