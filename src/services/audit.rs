//! Audit service
//!
//! Read access to the audit trail and the entry point for restorations.

use crate::audit::AuditLogEntry;
use crate::error::{AuditError, AuditResult};
use crate::models::{EntityType, LogId};
use crate::restore::{RestorationEngine, RestoreOutcome, RestorePlan};
use crate::storage::Storage;

use super::entity::Actor;

/// Service for querying the audit log and restoring from it
pub struct AuditService<'a> {
    storage: &'a Storage,
}

impl<'a> AuditService<'a> {
    /// Create a new audit service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn engine(&self) -> RestorationEngine<'a> {
        RestorationEngine::new(&self.storage.audit, self.storage.registry())
    }

    /// Most recent entries, newest first, optionally for one target
    pub fn recent(&self, limit: usize, target_id: Option<&str>) -> AuditResult<Vec<AuditLogEntry>> {
        match target_id {
            Some(target_id) => {
                let mut entries = self.storage.audit.history_for_target(target_id)?;
                entries.truncate(limit);
                Ok(entries)
            }
            None => {
                let mut entries = self.storage.audit.read_recent(limit)?;
                entries.reverse();
                Ok(entries)
            }
        }
    }

    /// Resolve a full id, or the short `log-xxxxxxxx` form shown in tables
    pub fn resolve_id(&self, input: &str) -> AuditResult<LogId> {
        if let Ok(id) = LogId::parse(input) {
            return Ok(id);
        }

        let prefix = input.trim();
        let prefix = prefix.strip_prefix("log-").unwrap_or(prefix).to_lowercase();
        if prefix.len() < 4 || !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(AuditError::Validation(format!("Invalid log id: {}", input)));
        }

        let mut matches = self
            .storage
            .audit
            .read_all()?
            .into_iter()
            .filter(|entry| entry.id.to_string().starts_with(&prefix));

        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.id),
            (None, _) => Err(AuditError::LogNotFound(input.to_string())),
            (Some(_), Some(_)) => Err(AuditError::Validation(format!(
                "Log id '{}' is ambiguous, use the full id",
                input
            ))),
        }
    }

    /// Look up an entry by full or short id
    pub fn get(&self, input: &str) -> AuditResult<AuditLogEntry> {
        let id = self.resolve_id(input)?;
        self.storage
            .audit
            .find_by_id(id)?
            .ok_or_else(|| AuditError::LogNotFound(input.to_string()))
    }

    /// All entries for a target, newest first
    pub fn history(&self, target_id: &str) -> AuditResult<Vec<AuditLogEntry>> {
        self.storage.audit.history_for_target(target_id)
    }

    /// Entity type an entry would be restored as
    pub fn classify(&self, entry: &AuditLogEntry) -> Option<EntityType> {
        self.storage.registry().resolve_for_entry(entry)
    }

    /// Compute what restoring to `log_id` would change, without writing
    pub fn plan_restore(&self, log_id: LogId) -> AuditResult<RestorePlan> {
        self.engine().plan(log_id)
    }

    /// Restore the entry's target to its state right after `log_id`
    pub fn restore(&self, log_id: LogId, actor: Actor<'_>) -> AuditResult<RestoreOutcome> {
        self.engine().restore(log_id, actor.id, actor.ip)
    }
}
