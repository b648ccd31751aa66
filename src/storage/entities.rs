//! JSON-file entity repository
//!
//! One file per entity type (`data/users.json`, ...). Records are cached in
//! memory behind an `RwLock` and the whole file is rewritten atomically on
//! each mutation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{AuditError, AuditResult};
use crate::models::{EntityRecord, EntityType, Patch};
use crate::registry::EntityStore;

use super::file_io::{read_json, write_json_atomic};

/// Serializable file layout
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct EntityData {
    records: Vec<EntityRecord>,
}

/// Repository for the records of one entity type
pub struct JsonEntityStore {
    entity_type: EntityType,
    path: PathBuf,
    data: RwLock<HashMap<String, EntityRecord>>,
}

impl JsonEntityStore {
    /// Create a new repository for `entity_type` stored at `path`
    pub fn new(entity_type: EntityType, path: PathBuf) -> Self {
        Self {
            entity_type,
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> AuditResult<RwLockReadGuard<'_, HashMap<String, EntityRecord>>> {
        self.data
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> AuditResult<RwLockWriteGuard<'_, HashMap<String, EntityRecord>>> {
        self.data
            .write()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn persist(&self, data: &HashMap<String, EntityRecord>) -> AuditResult<()> {
        let mut records: Vec<EntityRecord> = data.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        write_json_atomic(&self.path, &EntityData { records })
    }

    /// Load records from disk
    pub fn load(&self) -> AuditResult<()> {
        let file_data: EntityData = read_json(&self.path)?;
        let mut data = self.write()?;

        data.clear();
        for record in file_data.records {
            data.insert(record.id.clone(), record);
        }

        tracing::debug!(
            entity_type = %self.entity_type,
            count = data.len(),
            "Loaded entity records"
        );
        Ok(())
    }

    /// Insert a new record and persist it
    pub fn insert(&self, record: EntityRecord) -> AuditResult<EntityRecord> {
        record
            .validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        let mut data = self.write()?;
        if data.contains_key(&record.id) {
            return Err(AuditError::Duplicate {
                entity_type: self.entity_type.as_str(),
                identifier: record.id,
            });
        }

        data.insert(record.id.clone(), record.clone());
        if let Err(e) = self.persist(&data) {
            data.remove(&record.id);
            return Err(e);
        }

        Ok(record)
    }

    /// Remove a record and persist; returns the removed record
    pub fn remove(&self, id: &str) -> AuditResult<Option<EntityRecord>> {
        let mut data = self.write()?;
        let Some(removed) = data.remove(id) else {
            return Ok(None);
        };

        if let Err(e) = self.persist(&data) {
            data.insert(removed.id.clone(), removed);
            return Err(e);
        }

        Ok(Some(removed))
    }

    /// Get all records, ordered by id
    pub fn get_all(&self) -> AuditResult<Vec<EntityRecord>> {
        let data = self.read()?;
        let mut records: Vec<_> = data.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    /// Count records
    pub fn count(&self) -> AuditResult<usize> {
        Ok(self.read()?.len())
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl EntityStore for JsonEntityStore {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn get_by_id(&self, id: &str) -> AuditResult<Option<EntityRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn update_by_id(
        &self,
        id: &str,
        patch: &Patch,
        expected_version: Option<u64>,
    ) -> AuditResult<Option<EntityRecord>> {
        let mut data = self.write()?;

        let Some(record) = data.get_mut(id) else {
            return Ok(None);
        };

        if let Some(expected) = expected_version {
            if record.version != expected {
                return Err(AuditError::Conflict {
                    entity_type: self.entity_type.as_str(),
                    identifier: id.to_string(),
                    expected,
                    found: record.version,
                });
            }
        }

        let previous = record.clone();
        record.apply_patch(patch);
        if let Err(e) = record.validate() {
            *record = previous;
            return Err(AuditError::Validation(e.to_string()));
        }
        let updated = record.clone();

        // Roll the cache back if the file could not be written
        if let Err(e) = self.persist(&data) {
            data.insert(previous.id.clone(), previous);
            return Err(e);
        }

        Ok(Some(updated))
    }
}
