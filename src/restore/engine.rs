//! Restoration engine
//!
//! Returns an entity to the state it held right after a chosen audit entry by
//! reverting every field changed by later entries for the same target. The
//! patch is applied through the entity's `EntityStore` with the version read
//! before the history was scanned; the restoration entry is only appended once
//! the patch has been committed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audit::{AuditLogEntry, AuditLogStore, Details, PendingEntry};
use crate::error::{AuditError, AuditResult};
use crate::models::{EntityType, LogId, Patch};
use crate::registry::{EntityStore, ModelRegistry};

use super::patch::{build_reverse_patch, ReversePatch};

use std::sync::Arc;

/// Details stored on a `RESTORE_*` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreDetails {
    pub restored_to_log_id: LogId,
    pub reverted_logs_count: usize,
    pub reverted_fields: Vec<String>,
    pub patch: Patch,
}

impl RestoreDetails {
    pub fn into_details(self) -> Details {
        let mut details = Details::new();
        details.insert(
            "restoredToLogId".to_string(),
            Value::String(self.restored_to_log_id.to_string()),
        );
        details.insert(
            "revertedLogsCount".to_string(),
            Value::from(self.reverted_logs_count),
        );
        details.insert(
            "revertedFields".to_string(),
            Value::from(self.reverted_fields),
        );
        details.insert("patch".to_string(), Value::Object(self.patch));
        details
    }

    /// Read the restoration details back from an entry, if it carries them
    pub fn from_entry(entry: &AuditLogEntry) -> Option<Self> {
        let details = entry.details.as_ref()?;
        serde_json::from_value(Value::Object(details.clone())).ok()
    }
}

/// What a restoration would do, computed without writing anything
#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    /// The entry being restored to
    pub target: AuditLogEntry,
    pub target_id: String,
    pub entity_type: EntityType,
    /// Entries for the same entity written after `target`, newest first
    pub subsequent: Vec<AuditLogEntry>,
    pub reverse: ReversePatch,
    /// Entity version observed before the history was read; `None` if gone
    pub base_version: Option<u64>,
}

/// Result of a restoration
///
/// `restored == false` is a successful no-op: nothing changed after the
/// target entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverted_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverted_fields: Option<Vec<String>>,
    /// Id of the `RESTORE_*` entry, when it could be written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restoration_log_id: Option<LogId>,
}

impl RestoreOutcome {
    pub fn unchanged() -> Self {
        Self {
            restored: false,
            reverted_count: None,
            reverted_fields: None,
            restoration_log_id: None,
        }
    }
}

/// Computes and applies reverse patches
pub struct RestorationEngine<'a> {
    audit: &'a AuditLogStore,
    registry: &'a ModelRegistry,
}

impl<'a> RestorationEngine<'a> {
    pub fn new(audit: &'a AuditLogStore, registry: &'a ModelRegistry) -> Self {
        Self { audit, registry }
    }

    fn delegate_for(
        &self,
        entity_type: EntityType,
        action: &str,
    ) -> AuditResult<Arc<dyn EntityStore>> {
        self.registry
            .resolve_delegate(entity_type)
            .ok_or_else(|| AuditError::UnresolvedModel(action.to_string()))
    }

    /// Compute the restoration for `log_id` without applying it
    pub fn plan(&self, log_id: LogId) -> AuditResult<RestorePlan> {
        let target = self
            .audit
            .find_by_id(log_id)?
            .ok_or_else(|| AuditError::LogNotFound(log_id.to_string()))?;

        let target_id = target
            .target_id
            .clone()
            .ok_or_else(|| AuditError::NoTargetId(log_id.to_string()))?;

        let entity_type = self
            .registry
            .resolve_for_entry(&target)
            .ok_or_else(|| AuditError::UnresolvedModel(target.action.clone()))?;
        let delegate = self.delegate_for(entity_type, &target.action)?;

        // Version first: any write after this point makes the apply step conflict
        let base_version = delegate.get_by_id(&target_id)?.map(|record| record.version);

        // Ids are only unique per entity type
        let subsequent: Vec<AuditLogEntry> = self
            .audit
            .find_subsequent_for_target(&target_id, target.position())?
            .into_iter()
            .filter(|entry| self.registry.resolve_for_entry(entry) == Some(entity_type))
            .collect();
        let reverse = build_reverse_patch(&subsequent);

        Ok(RestorePlan {
            target,
            target_id,
            entity_type,
            subsequent,
            reverse,
            base_version,
        })
    }

    /// Restore the target of `log_id` to its state right after that entry
    ///
    /// # Errors
    ///
    /// `LogNotFound`, `NoTargetId`, `UnresolvedModel`, `EntityGone` and
    /// `Conflict`. No audit entry is written when any of them is returned.
    pub fn restore(
        &self,
        log_id: LogId,
        actor_id: &str,
        ip: Option<&str>,
    ) -> AuditResult<RestoreOutcome> {
        let plan = self.plan(log_id)?;

        if plan.reverse.is_empty() {
            tracing::info!(
                %log_id,
                target_id = %plan.target_id,
                subsequent = plan.subsequent.len(),
                "Nothing changed after entry, restoration is a no-op"
            );
            return Ok(RestoreOutcome::unchanged());
        }

        let entity_gone = || AuditError::EntityGone {
            entity_type: plan.entity_type.as_str(),
            identifier: plan.target_id.clone(),
        };

        let base_version = plan.base_version.ok_or_else(entity_gone)?;
        let delegate = self.delegate_for(plan.entity_type, &plan.target.action)?;

        let updated = delegate
            .update_by_id(&plan.target_id, &plan.reverse.patch, Some(base_version))?
            .ok_or_else(entity_gone)?;

        let reverted_fields = plan.reverse.fields();
        let reverted_count = plan.reverse.contributing_entries;

        let details = RestoreDetails {
            restored_to_log_id: log_id,
            reverted_logs_count: reverted_count,
            reverted_fields: reverted_fields.clone(),
            patch: plan.reverse.patch,
        };

        let entry = self.audit.record(
            PendingEntry::new(actor_id, plan.entity_type.restore_action())
                .entity_type(plan.entity_type)
                .target(Some(plan.target_id.as_str()))
                .details(Some(details.into_details()))
                .ip(ip),
        );

        if entry.is_none() {
            tracing::warn!(
                %log_id,
                target_id = %plan.target_id,
                "Restoration applied but its audit entry was not written"
            );
        }

        tracing::info!(
            %log_id,
            entity_type = %plan.entity_type,
            target_id = %plan.target_id,
            version = updated.version,
            reverted_count,
            fields = ?reverted_fields,
            "Entity restored"
        );

        Ok(RestoreOutcome {
            restored: true,
            reverted_count: Some(reverted_count),
            reverted_fields: Some(reverted_fields),
            restoration_log_id: entry.map(|e| e.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuditPaths, Settings};
    use crate::models::EntityRecord;
    use crate::storage::{JsonEntityStore, Storage};
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn setup() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths, &Settings::default()).unwrap();
        (temp_dir, storage)
    }

    fn create_user(storage: &Storage, id: &str, initial: Value) {
        storage
            .entities(EntityType::User)
            .unwrap()
            .insert(EntityRecord::new(id, fields(initial)))
            .unwrap();
    }

    /// Mutate a user the way a request handler would, then log it
    fn update_user(storage: &Storage, id: &str, changes: Value) -> AuditLogEntry {
        let users = storage.entities(EntityType::User).unwrap();
        let before = users.get_by_id(id).unwrap().unwrap();
        let after = users
            .update_by_id(id, &fields(changes), None)
            .unwrap()
            .unwrap();
        storage
            .audit
            .append_detailed(
                "admin-1",
                "UPDATE_USER_PROFILE",
                Some(id),
                &before.snapshot(),
                &after.snapshot(),
                Some("10.0.0.1"),
                None,
            )
            .unwrap()
    }

    fn user(storage: &Storage, id: &str) -> Option<EntityRecord> {
        storage
            .entities(EntityType::User)
            .unwrap()
            .get_by_id(id)
            .unwrap()
    }

    fn engine(storage: &Storage) -> RestorationEngine<'_> {
        RestorationEngine::new(&storage.audit, storage.registry())
    }

    #[test]
    fn test_reverse_patch_chain() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        update_user(&storage, "u-1", json!({"name": "C"}));
        update_user(&storage, "u-1", json!({"name": "D"}));

        let plan = engine(&storage).plan(l1.id).unwrap();
        assert_eq!(plan.reverse.patch, fields(json!({"name": "B"})));
        assert_eq!(plan.subsequent.len(), 2);

        let outcome = engine(&storage).restore(l1.id, "admin-2", None).unwrap();

        assert!(outcome.restored);
        assert_eq!(outcome.reverted_count, Some(1));
        assert_eq!(outcome.reverted_fields, Some(vec!["name".to_string()]));
        assert_eq!(user(&storage, "u-1").unwrap().get("name"), Some(&json!("B")));
    }

    #[test]
    fn test_fields_are_reverted_independently() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A", "email": "a@plinkk.fr"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        let l2 = update_user(&storage, "u-1", json!({"email": "b@plinkk.fr"}));
        let l3 = update_user(&storage, "u-1", json!({"name": "C"}));

        let plan = engine(&storage).plan(l1.id).unwrap();
        assert_eq!(plan.reverse.patch.get("name"), Some(&l3.diff["name"].old));
        // email was only touched by L2, which is still after L1
        assert_eq!(plan.reverse.patch.get("email"), Some(&l2.diff["email"].old));

        let outcome = engine(&storage).restore(l1.id, "admin-2", None).unwrap();
        assert_eq!(outcome.reverted_count, Some(2));

        let restored = user(&storage, "u-1").unwrap();
        assert_eq!(restored.get("name"), Some(&json!("B")));
        assert_eq!(restored.get("email"), Some(&json!("a@plinkk.fr")));
    }

    #[test]
    fn test_no_subsequent_entries_is_a_noop() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A"}));
        update_user(&storage, "u-1", json!({"name": "B"}));
        let latest = update_user(&storage, "u-1", json!({"name": "C"}));

        let count_before = storage.audit.entry_count().unwrap();
        let version_before = user(&storage, "u-1").unwrap().version;

        let outcome = engine(&storage).restore(latest.id, "admin-2", None).unwrap();

        assert_eq!(outcome, RestoreOutcome::unchanged());
        assert_eq!(storage.audit.entry_count().unwrap(), count_before);
        assert_eq!(user(&storage, "u-1").unwrap().version, version_before);
    }

    #[test]
    fn test_deleted_entity_fails_without_logging() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        update_user(&storage, "u-1", json!({"name": "C"}));

        let removed = storage
            .entities(EntityType::User)
            .unwrap()
            .remove("u-1")
            .unwrap()
            .unwrap();
        storage.audit.append_detailed(
            "admin-1",
            "DELETE_USER",
            Some("u-1"),
            &removed.snapshot(),
            &Map::new(),
            None,
            None,
        );
        let count_before = storage.audit.entry_count().unwrap();

        let err = engine(&storage).restore(l1.id, "admin-2", None).unwrap_err();

        assert!(matches!(err, AuditError::EntityGone { .. }));
        assert_eq!(storage.audit.entry_count().unwrap(), count_before);
    }

    #[test]
    fn test_restoration_is_audited_and_history_untouched() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        update_user(&storage, "u-1", json!({"name": "C"}));

        let log_before = std::fs::read(storage.audit.path()).unwrap();

        let outcome = engine(&storage)
            .restore(l1.id, "admin-2", Some("192.0.2.9"))
            .unwrap();

        let log_after = std::fs::read(storage.audit.path()).unwrap();
        assert!(log_after.starts_with(&log_before));

        let subsequent = storage
            .audit
            .find_subsequent_for_target("u-1", l1.position())
            .unwrap();
        let restoration = &subsequent[0];

        assert_eq!(Some(restoration.id), outcome.restoration_log_id);
        assert_eq!(restoration.action, "RESTORE_USER");
        assert_eq!(restoration.entity_type, Some(EntityType::User));
        assert_eq!(restoration.actor_id, "admin-2");
        assert_eq!(restoration.ip.as_deref(), Some("192.0.2.9"));
        assert!(restoration.diff.is_empty());

        let details = RestoreDetails::from_entry(restoration).unwrap();
        assert_eq!(details.restored_to_log_id, l1.id);
        assert_eq!(details.reverted_logs_count, 1);
        assert_eq!(details.reverted_fields, vec!["name".to_string()]);
        assert_eq!(details.patch, fields(json!({"name": "B"})));
    }

    #[test]
    fn test_second_restore_reapplies_same_patch() {
        let (_temp, storage) = setup();
        create_user(&storage, "u-1", json!({"name": "A"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        update_user(&storage, "u-1", json!({"name": "C"}));
        update_user(&storage, "u-1", json!({"name": "D"}));

        let first = engine(&storage).restore(l1.id, "admin-2", None).unwrap();
        let version_after_first = user(&storage, "u-1").unwrap().version;

        // The first restoration's entry has an empty diff, so it contributes
        // nothing and the same patch is applied again
        let second = engine(&storage).restore(l1.id, "admin-2", None).unwrap();

        assert!(second.restored);
        assert_eq!(second.reverted_fields, first.reverted_fields);
        assert_eq!(second.reverted_count, first.reverted_count);
        assert_ne!(second.restoration_log_id, first.restoration_log_id);

        let record = user(&storage, "u-1").unwrap();
        assert_eq!(record.get("name"), Some(&json!("B")));
        assert_eq!(record.version, version_after_first + 1);

        let restorations = storage
            .audit
            .history_for_target("u-1")
            .unwrap()
            .into_iter()
            .filter(|e| e.action == "RESTORE_USER")
            .count();
        assert_eq!(restorations, 2);
    }

    #[test]
    fn test_same_id_in_another_type_is_ignored() {
        let (_temp, storage) = setup();
        create_user(&storage, "x", json!({"name": "A"}));
        let l1 = update_user(&storage, "x", json!({"name": "B"}));

        let service = crate::services::EntityService::new(&storage);
        let admin = crate::services::Actor::new("admin-1", None);
        service
            .create(EntityType::Theme, Some("x"), fields(json!({"primary": "#000"})), admin)
            .unwrap();
        service
            .update(EntityType::Theme, "x", &fields(json!({"primary": "#fff"})), None, admin)
            .unwrap();

        let plan = engine(&storage).plan(l1.id).unwrap();
        assert!(plan.subsequent.is_empty());

        let outcome = engine(&storage).restore(l1.id, "admin-2", None).unwrap();
        assert!(!outcome.restored);

        let user = user(&storage, "x").unwrap();
        assert_eq!(user.get("name"), Some(&json!("B")));
        assert!(user.get("primary").is_none());
    }

    #[test]
    fn test_restore_with_narrowed_exclusion_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings {
            excluded_fields: ["password".to_string()].into_iter().collect(),
            ..Settings::default()
        };
        let storage = Storage::new(paths, &settings).unwrap();

        create_user(&storage, "u-1", json!({"name": "A"}));
        let l1 = update_user(&storage, "u-1", json!({"name": "B"}));
        let l2 = update_user(&storage, "u-1", json!({"name": "C"}));
        assert!(!l2.diff.contains_key("updatedAt"));

        let outcome = engine(&storage).restore(l1.id, "admin-2", None).unwrap();

        assert_eq!(outcome.reverted_fields, Some(vec!["name".to_string()]));
        assert_eq!(user(&storage, "u-1").unwrap().get("name"), Some(&json!("B")));
    }

    #[test]
    fn test_unknown_log() {
        let (_temp, storage) = setup();
        let err = engine(&storage)
            .restore(LogId::new(), "admin", None)
            .unwrap_err();
        assert!(matches!(err, AuditError::LogNotFound(_)));
    }

    #[test]
    fn test_entry_without_target() {
        let (_temp, storage) = setup();
        let entry = storage
            .audit
            .append("admin", "UPDATE_USER_SETTINGS", None, Default::default(), None)
            .unwrap();

        let err = engine(&storage).restore(entry.id, "admin", None).unwrap_err();
        assert!(matches!(err, AuditError::NoTargetId(_)));
    }

    #[test]
    fn test_unclassifiable_action() {
        let (_temp, storage) = setup();
        let entry = storage
            .audit
            .append("admin", "LOGIN", Some("u-1"), Default::default(), None)
            .unwrap();

        let err = engine(&storage).restore(entry.id, "admin", None).unwrap_err();
        assert!(matches!(err, AuditError::UnresolvedModel(ref action) if action == "LOGIN"));
    }

    #[test]
    fn test_recorded_entity_type_is_used_for_untagged_actions() {
        let (_temp, storage) = setup();
        let themes = storage.entities(EntityType::Theme).unwrap();
        themes
            .insert(EntityRecord::new("t-1", fields(json!({"primary": "#000"}))))
            .unwrap();

        let mut entries = Vec::new();
        for color in ["#111", "#222"] {
            let before = themes.get_by_id("t-1").unwrap().unwrap();
            let after = themes
                .update_by_id("t-1", &fields(json!({"primary": color})), None)
                .unwrap()
                .unwrap();
            let entry = storage
                .audit
                .record_changes(
                    PendingEntry::new("admin", "BULK_EDIT")
                        .entity_type(EntityType::Theme)
                        .target(Some("t-1")),
                    &before.snapshot(),
                    &after.snapshot(),
                )
                .unwrap();
            entries.push(entry);
        }

        let outcome = engine(&storage).restore(entries[0].id, "admin", None).unwrap();
        assert!(outcome.restored);
        assert_eq!(
            themes.get_by_id("t-1").unwrap().unwrap().get("primary"),
            Some(&json!("#111"))
        );

        let restoration = storage.audit.history_for_target("t-1").unwrap().remove(0);
        assert_eq!(restoration.action, "RESTORE_THEME");
    }

    /// Store that lets another writer slip in between the read and the update
    struct RacingStore {
        inner: JsonEntityStore,
    }

    impl EntityStore for RacingStore {
        fn entity_type(&self) -> EntityType {
            self.inner.entity_type()
        }

        fn get_by_id(&self, id: &str) -> AuditResult<Option<EntityRecord>> {
            self.inner.get_by_id(id)
        }

        fn update_by_id(
            &self,
            id: &str,
            patch: &Patch,
            expected_version: Option<u64>,
        ) -> AuditResult<Option<EntityRecord>> {
            self.inner
                .update_by_id(id, &fields(json!({"bio": "concurrent"})), None)?;
            self.inner.update_by_id(id, patch, expected_version)
        }
    }

    #[test]
    fn test_concurrent_change_is_a_conflict() {
        let temp = TempDir::new().unwrap();
        let audit = AuditLogStore::new(temp.path().join("audit.log"));
        let inner = JsonEntityStore::new(EntityType::User, temp.path().join("users.json"));
        inner
            .insert(EntityRecord::new("u-1", fields(json!({"name": "A"}))))
            .unwrap();
        let store = Arc::new(RacingStore { inner });
        let registry = ModelRegistry::default().with_store(store.clone());

        let mut logged = Vec::new();
        for name in ["B", "C"] {
            let before = store.get_by_id("u-1").unwrap().unwrap();
            let after = store
                .inner
                .update_by_id("u-1", &fields(json!({"name": name})), None)
                .unwrap()
                .unwrap();
            logged.push(
                audit
                    .append_detailed(
                        "admin",
                        "UPDATE_USER",
                        Some("u-1"),
                        &before.snapshot(),
                        &after.snapshot(),
                        None,
                        None,
                    )
                    .unwrap(),
            );
        }
        let count_before = audit.entry_count().unwrap();

        let err = RestorationEngine::new(&audit, &registry)
            .restore(logged[0].id, "admin", None)
            .unwrap_err();

        assert!(matches!(err, AuditError::Conflict { .. }));
        assert_eq!(audit.entry_count().unwrap(), count_before);
        assert_eq!(
            store.get_by_id("u-1").unwrap().unwrap().get("name"),
            Some(&json!("C"))
        );
    }
}
