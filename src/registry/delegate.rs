//! Capability interface every restorable entity store implements

use crate::error::AuditResult;
use crate::models::{EntityRecord, EntityType, Patch};

/// Generic read/update access to the records of one entity type
pub trait EntityStore: Send + Sync {
    /// The entity type this store holds
    fn entity_type(&self) -> EntityType;

    /// Get a record by id
    fn get_by_id(&self, id: &str) -> AuditResult<Option<EntityRecord>>;

    /// Write `patch` into a record and persist it
    ///
    /// Returns `Ok(None)` when the record does not exist. When
    /// `expected_version` is given and differs from the stored version, fails
    /// with `AuditError::Conflict` and leaves the record untouched.
    fn update_by_id(
        &self,
        id: &str,
        patch: &Patch,
        expected_version: Option<u64>,
    ) -> AuditResult<Option<EntityRecord>>;
}
