//! Storage layer for plinkk-audit
//!
//! Reference persistence for the entity types plus the audit log. The
//! restoration engine only sees the entity stores through `EntityStore`.

pub mod entities;
pub mod file_io;

pub use entities::JsonEntityStore;
pub use file_io::{append_json_line, count_json_lines, read_json, read_json_lines, write_json_atomic};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::audit::AuditLogStore;
use crate::config::{AuditPaths, Settings};
use crate::error::{AuditError, AuditResult};
use crate::models::EntityType;
use crate::registry::ModelRegistry;

/// Storage coordinator: one store per entity type, the audit log, and the
/// registry wiring them together
pub struct Storage {
    paths: AuditPaths,
    pub audit: AuditLogStore,
    entities: BTreeMap<EntityType, Arc<JsonEntityStore>>,
    registry: ModelRegistry,
}

impl Storage {
    /// Open storage under `paths` using `settings` for the audit policy
    pub fn new(paths: AuditPaths, settings: &Settings) -> AuditResult<Self> {
        paths.ensure_directories()?;

        let audit = AuditLogStore::new(paths.audit_log())
            .with_excluded_fields(settings.excluded_fields.clone());

        let mut registry = ModelRegistry::new(settings.classifier());
        let mut entities = BTreeMap::new();
        for entity_type in EntityType::ALL {
            let store = Arc::new(JsonEntityStore::new(
                entity_type,
                paths.entity_file(entity_type),
            ));
            registry.register(store.clone());
            entities.insert(entity_type, store);
        }

        Ok(Self {
            paths,
            audit,
            entities,
            registry,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// The registry with every entity store registered
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// The store for an entity type
    pub fn entities(&self, entity_type: EntityType) -> AuditResult<&JsonEntityStore> {
        self.entities
            .get(&entity_type)
            .map(|store| store.as_ref())
            .ok_or_else(|| AuditError::Storage(format!("No store for {}", entity_type)))
    }

    /// Load all entity data from disk
    pub fn load_all(&self) -> AuditResult<()> {
        for store in self.entities.values() {
            store.load()?;
        }
        Ok(())
    }
}
