//! Append-only audit log store
//!
//! Entries are written to a line-delimited JSON file (JSONL), one complete
//! entry per line, flushed immediately. There is no update or delete path.
//!
//! Every public append method is best-effort: a storage failure is logged and
//! counted but never returned, so audit logging cannot break the mutation it
//! observes. `try_append` is the fallible call they all wrap.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::error::{AuditError, AuditResult};
use crate::models::{LogId, Snapshot};
use crate::storage::{append_json_line, count_json_lines, read_json_lines};

use super::diff::{compute_diff, default_excluded_fields, Diff};
use super::entry::{AuditLogEntry, Details, LogPosition, PendingEntry};

/// Where the next append continues from
#[derive(Debug, Clone, Copy)]
struct AppendCursor {
    last_sequence: u64,
    last_created_at: Option<DateTime<Utc>>,
}

/// Append-only store for audit log entries
///
/// The next sequence number is cached in memory after the first append, so a
/// store must be the only writer to its log file. Two stores appending to the
/// same file can hand out the same sequence.
pub struct AuditLogStore {
    /// Path to the audit log file
    log_path: PathBuf,
    /// Fields stripped from diffs computed by `append_detailed`
    excluded_fields: BTreeSet<String>,
    /// Serializes appends; loaded from the file on first use
    cursor: Mutex<Option<AppendCursor>>,
    /// Number of appends that failed and were dropped
    failures: AtomicU64,
}

impl AuditLogStore {
    /// Create a store that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            excluded_fields: default_excluded_fields(),
            cursor: Mutex::new(None),
            failures: AtomicU64::new(0),
        }
    }

    /// Exclude more fields from computed diffs
    ///
    /// The default credential and timestamp fields stay excluded whatever is
    /// passed here.
    pub fn with_excluded_fields(mut self, excluded_fields: BTreeSet<String>) -> Self {
        self.excluded_fields.extend(excluded_fields);
        self
    }

    /// Fields stripped from computed diffs
    pub fn excluded_fields(&self) -> &BTreeSet<String> {
        &self.excluded_fields
    }

    /// Append one entry with a precomputed diff (best-effort)
    pub fn append(
        &self,
        actor_id: &str,
        action: &str,
        target_id: Option<&str>,
        diff: Diff,
        ip: Option<&str>,
    ) -> Option<AuditLogEntry> {
        self.record(
            PendingEntry::new(actor_id, action)
                .target(target_id)
                .diff(diff)
                .ip(ip),
        )
    }

    /// Diff two snapshots and append the result (best-effort)
    ///
    /// Nothing is written when no tracked field changed.
    #[allow(clippy::too_many_arguments)]
    pub fn append_detailed(
        &self,
        actor_id: &str,
        action: &str,
        target_id: Option<&str>,
        old_state: &Snapshot,
        new_state: &Snapshot,
        ip: Option<&str>,
        extra: Option<Details>,
    ) -> Option<AuditLogEntry> {
        let pending = PendingEntry::new(actor_id, action)
            .target(target_id)
            .details(extra)
            .ip(ip);
        self.record_changes(pending, old_state, new_state)
    }

    /// Diff two snapshots into an already tagged pending entry (best-effort)
    ///
    /// Any diff already set on `pending` is replaced.
    pub fn record_changes(
        &self,
        pending: PendingEntry,
        old_state: &Snapshot,
        new_state: &Snapshot,
    ) -> Option<AuditLogEntry> {
        let diff = compute_diff(old_state, new_state, &self.excluded_fields);
        if diff.is_empty() {
            tracing::trace!(action = %pending.action, "No tracked changes, skipping audit entry");
            return None;
        }

        self.record(pending.diff(diff))
    }

    /// Append a fully built entry (best-effort)
    pub fn record(&self, pending: PendingEntry) -> Option<AuditLogEntry> {
        let action = pending.action.clone();
        match self.try_append(pending) {
            Ok(entry) => Some(entry),
            Err(e) => {
                let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::error!(
                    action = %action,
                    failures,
                    path = %self.log_path.display(),
                    "Failed to write audit entry: {}",
                    e
                );
                None
            }
        }
    }

    /// Append an entry, returning any storage error
    ///
    /// Assigns the id, the next sequence number and a timestamp that never goes
    /// below the previous entry's. The cursor only advances once the line is
    /// flushed.
    pub fn try_append(&self, pending: PendingEntry) -> AuditResult<AuditLogEntry> {
        let mut guard = self
            .cursor
            .lock()
            .map_err(|e| AuditError::Storage(format!("Audit log lock poisoned: {}", e)))?;

        let cursor = match *guard {
            Some(cursor) => cursor,
            None => self.load_cursor()?,
        };

        let now = Utc::now();
        let created_at = match cursor.last_created_at {
            Some(last) if last > now => last,
            _ => now,
        };
        let sequence = cursor.last_sequence + 1;
        let entry = pending.into_entry(LogId::new(), sequence, created_at);

        append_json_line(&self.log_path, &entry)?;

        *guard = Some(AppendCursor {
            last_sequence: sequence,
            last_created_at: Some(created_at),
        });

        tracing::debug!(
            audit_id = %entry.id,
            sequence,
            action = %entry.action,
            target_id = entry.target_id.as_deref().unwrap_or("-"),
            "Audit entry recorded"
        );

        Ok(entry)
    }

    /// Number of appends dropped because of storage failures
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    fn load_cursor(&self) -> AuditResult<AppendCursor> {
        let entries = self.read_all()?;
        let last_sequence = entries.iter().map(|e| e.sequence).max().unwrap_or(0);
        let last_created_at = entries.iter().map(|e| e.created_at).max();
        Ok(AppendCursor {
            last_sequence,
            last_created_at,
        })
    }

    /// Read all audit entries from the log file
    ///
    /// Returns entries in insertion order (oldest first).
    pub fn read_all(&self) -> AuditResult<Vec<AuditLogEntry>> {
        read_json_lines(&self.log_path)
    }

    /// Read the most recent N entries, oldest first
    pub fn read_recent(&self, count: usize) -> AuditResult<Vec<AuditLogEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Find an entry by id
    pub fn find_by_id(&self, id: LogId) -> AuditResult<Option<AuditLogEntry>> {
        Ok(self.read_all()?.into_iter().find(|e| e.id == id))
    }

    /// Entries for a target written strictly after `after`, newest first
    pub fn find_subsequent_for_target(
        &self,
        target_id: &str,
        after: LogPosition,
    ) -> AuditResult<Vec<AuditLogEntry>> {
        let mut entries: Vec<AuditLogEntry> = self
            .read_all()?
            .into_iter()
            .filter(|e| e.targets(target_id) && e.position() > after)
            .collect();

        entries.sort_by(|a, b| b.position().cmp(&a.position()));
        Ok(entries)
    }

    /// Full history of a target, newest first
    pub fn history_for_target(&self, target_id: &str) -> AuditResult<Vec<AuditLogEntry>> {
        let mut entries: Vec<AuditLogEntry> = self
            .read_all()?
            .into_iter()
            .filter(|e| e.targets(target_id))
            .collect();

        entries.sort_by(|a, b| b.position().cmp(&a.position()));
        Ok(entries)
    }

    /// Get the number of entries in the audit log
    pub fn entry_count(&self) -> AuditResult<usize> {
        count_json_lines(&self.log_path)
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
