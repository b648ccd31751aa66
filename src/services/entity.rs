//! Entity service
//!
//! Reference mutation handlers for the audited entity types. Every mutation
//! snapshots the record before and after the change and hands both to the
//! audit log; a failed audit write never fails the mutation.

use uuid::Uuid;

use crate::audit::{AuditLogEntry, PendingEntry};
use crate::error::{AuditError, AuditResult};
use crate::models::{EntityRecord, EntityType, Patch, Snapshot};
use crate::registry::EntityStore;
use crate::storage::Storage;

/// Who performed a mutation and from where
#[derive(Debug, Clone, Copy)]
pub struct Actor<'a> {
    pub id: &'a str,
    pub ip: Option<&'a str>,
}

impl<'a> Actor<'a> {
    pub fn new(id: &'a str, ip: Option<&'a str>) -> Self {
        Self { id, ip }
    }
}

/// A record after a mutation, with the audit entry it produced (if any)
#[derive(Debug, Clone)]
pub struct Mutation {
    pub record: EntityRecord,
    pub audit_entry: Option<AuditLogEntry>,
}

/// Service for audited entity mutations
pub struct EntityService<'a> {
    storage: &'a Storage,
}

impl<'a> EntityService<'a> {
    /// Create a new entity service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn log(
        &self,
        entity_type: EntityType,
        action: &str,
        id: &str,
        actor: Actor<'_>,
        before: &Snapshot,
        after: &Snapshot,
    ) -> Option<AuditLogEntry> {
        self.storage.audit.record_changes(
            PendingEntry::new(actor.id, action)
                .entity_type(entity_type)
                .target(Some(id))
                .ip(actor.ip),
            before,
            after,
        )
    }

    /// Create a record, generating an id when none is given
    pub fn create(
        &self,
        entity_type: EntityType,
        id: Option<&str>,
        fields: Patch,
        actor: Actor<'_>,
    ) -> AuditResult<Mutation> {
        let id = match id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            Some(_) => {
                return Err(AuditError::Validation("Entity id cannot be empty".into()));
            }
            None => Uuid::new_v4().to_string(),
        };

        let record = self
            .storage
            .entities(entity_type)?
            .insert(EntityRecord::new(id, fields))?;

        let action = format!("CREATE_{}", entity_type);
        let audit_entry = self.log(
            entity_type,
            &action,
            &record.id,
            actor,
            &Snapshot::new(),
            &record.snapshot(),
        );

        Ok(Mutation {
            record,
            audit_entry,
        })
    }

    /// Apply `patch` to an existing record
    ///
    /// `action` overrides the default `UPDATE_<TYPE>` tag.
    pub fn update(
        &self,
        entity_type: EntityType,
        id: &str,
        patch: &Patch,
        action: Option<&str>,
        actor: Actor<'_>,
    ) -> AuditResult<Mutation> {
        if patch.is_empty() {
            return Err(AuditError::Validation("Nothing to update".into()));
        }

        let store = self.storage.entities(entity_type)?;
        let before = self.find(entity_type, id)?;

        let record = store
            .update_by_id(id, patch, Some(before.version))?
            .ok_or_else(|| AuditError::entity_not_found(entity_type.as_str(), id))?;

        let action = match action {
            Some(action) => action.trim().to_uppercase(),
            None => format!("UPDATE_{}", entity_type),
        };
        let audit_entry = self.log(
            entity_type,
            &action,
            id,
            actor,
            &before.snapshot(),
            &record.snapshot(),
        );

        Ok(Mutation {
            record,
            audit_entry,
        })
    }

    /// Delete a record, returning it as it was
    pub fn delete(
        &self,
        entity_type: EntityType,
        id: &str,
        actor: Actor<'_>,
    ) -> AuditResult<Mutation> {
        let record = self
            .storage
            .entities(entity_type)?
            .remove(id)?
            .ok_or_else(|| AuditError::entity_not_found(entity_type.as_str(), id))?;

        let action = format!("DELETE_{}", entity_type);
        let audit_entry = self.log(
            entity_type,
            &action,
            id,
            actor,
            &record.snapshot(),
            &Snapshot::new(),
        );

        Ok(Mutation {
            record,
            audit_entry,
        })
    }

    /// Get a record by id
    pub fn get(&self, entity_type: EntityType, id: &str) -> AuditResult<Option<EntityRecord>> {
        self.storage.entities(entity_type)?.get_by_id(id)
    }

    /// Get a record by id, failing if it does not exist
    pub fn find(&self, entity_type: EntityType, id: &str) -> AuditResult<EntityRecord> {
        self.get(entity_type, id)?
            .ok_or_else(|| AuditError::entity_not_found(entity_type.as_str(), id))
    }

    /// All records of a type, ordered by id
    pub fn list(&self, entity_type: EntityType) -> AuditResult<Vec<EntityRecord>> {
        let mut records = self.storage.entities(entity_type)?.get_all()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuditPaths, Settings};
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths, &Settings::default()).unwrap();
        (temp_dir, storage)
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    const ADMIN: Actor<'static> = Actor {
        id: "admin-1",
        ip: Some("10.0.0.1"),
    };

    #[test]
    fn test_create_logs_every_field() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);

        let created = service
            .create(
                EntityType::User,
                Some("u-1"),
                fields(json!({"name": "Ana", "password": "hunter2"})),
                ADMIN,
            )
            .unwrap();

        assert_eq!(created.record.version, 1);
        let entry = created.audit_entry.unwrap();
        assert_eq!(entry.action, "CREATE_USER");
        assert_eq!(entry.entity_type, Some(EntityType::User));
        assert_eq!(entry.target_id.as_deref(), Some("u-1"));
        assert_eq!(entry.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(entry.diff["name"].old, Value::Null);
        assert_eq!(entry.diff["name"].new, json!("Ana"));
        assert!(!entry.diff.contains_key("password"));
        assert!(!entry.diff.contains_key("createdAt"));
    }

    #[test]
    fn test_create_generates_id() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);

        let created = service
            .create(EntityType::Theme, None, Map::new(), ADMIN)
            .unwrap();

        assert!(Uuid::parse_str(&created.record.id).is_ok());
        // No tracked field, nothing to log
        assert!(created.audit_entry.is_none());
    }

    #[test]
    fn test_create_rejects_blank_id() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);

        let err = service
            .create(EntityType::User, Some("  "), Map::new(), ADMIN)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_update_logs_only_changed_fields() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);
        service
            .create(
                EntityType::User,
                Some("u-1"),
                fields(json!({"name": "Ana", "email": "ana@plinkk.fr"})),
                ADMIN,
            )
            .unwrap();

        let updated = service
            .update(
                EntityType::User,
                "u-1",
                &fields(json!({"name": "Anna", "email": "ana@plinkk.fr"})),
                None,
                ADMIN,
            )
            .unwrap();

        assert_eq!(updated.record.version, 2);
        let entry = updated.audit_entry.unwrap();
        assert_eq!(entry.action, "UPDATE_USER");
        assert_eq!(entry.diff.len(), 1);
        assert_eq!(entry.diff["name"].old, json!("Ana"));
    }

    #[test]
    fn test_update_with_custom_action() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);
        service
            .create(EntityType::User, Some("u-1"), Map::new(), ADMIN)
            .unwrap();

        let updated = service
            .update(
                EntityType::User,
                "u-1",
                &fields(json!({"totpEnabled": false})),
                Some("admin_disable_2fa"),
                ADMIN,
            )
            .unwrap();

        assert_eq!(updated.audit_entry.unwrap().action, "ADMIN_DISABLE_2FA");
    }

    #[test]
    fn test_update_without_changes_writes_no_entry() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);
        service
            .create(
                EntityType::Plinkk,
                Some("p-1"),
                fields(json!({"slug": "ana"})),
                ADMIN,
            )
            .unwrap();
        let count = storage.audit.entry_count().unwrap();

        let updated = service
            .update(
                EntityType::Plinkk,
                "p-1",
                &fields(json!({"slug": "ana"})),
                None,
                ADMIN,
            )
            .unwrap();

        assert!(updated.audit_entry.is_none());
        assert_eq!(storage.audit.entry_count().unwrap(), count);
    }

    #[test]
    fn test_update_missing_record() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);

        let err = service
            .update(
                EntityType::Role,
                "r-404",
                &fields(json!({"name": "x"})),
                None,
                ADMIN,
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_update_rejects_empty_patch() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);

        let err = service
            .update(EntityType::Role, "r-1", &Map::new(), None, ADMIN)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_delete_logs_old_values() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);
        service
            .create(
                EntityType::Redirect,
                Some("r-1"),
                fields(json!({"slug": "yt", "url": "https://youtube.com"})),
                ADMIN,
            )
            .unwrap();

        let deleted = service.delete(EntityType::Redirect, "r-1", ADMIN).unwrap();

        let entry = deleted.audit_entry.unwrap();
        assert_eq!(entry.action, "DELETE_REDIRECT");
        assert_eq!(entry.diff["slug"].new, Value::Null);
        assert!(service.get(EntityType::Redirect, "r-1").unwrap().is_none());
    }

    #[test]
    fn test_list_is_sorted() {
        let (_temp, storage) = create_test_storage();
        let service = EntityService::new(&storage);
        for id in ["b", "c", "a"] {
            service
                .create(EntityType::Theme, Some(id), Map::new(), ADMIN)
                .unwrap();
        }

        let ids: Vec<String> = service
            .list(EntityType::Theme)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
