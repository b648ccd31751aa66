//! Audit entry data structures
//!
//! Defines the stored audit entry, the position used to order entries, and
//! the pending entry callers build before the store assigns id, sequence and
//! timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::diff::{summarize_diff, Diff};
use crate::models::{EntityType, LogId};

/// Auxiliary data stored next to the diff
pub type Details = Map<String, Value>;

/// Position of an entry in the log
///
/// Ordered by timestamp first, then by insertion sequence, so entries written
/// within the same clock tick still have a total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LogPosition {
    pub created_at: DateTime<Utc>,
    pub sequence: u64,
}

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Unique identifier
    pub id: LogId,

    /// Insertion order within the log, starting at 1
    pub sequence: u64,

    /// Who performed the action
    pub actor_id: String,

    /// Free-form uppercase action tag, e.g. `UPDATE_USER_PROFILE`
    pub action: String,

    /// Entity type, when the call site recorded it explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,

    /// Identifier of the affected entity
    #[serde(default)]
    pub target_id: Option<String>,

    /// Changed fields only
    #[serde(default)]
    pub diff: Diff,

    /// Auxiliary data, not interpreted by restoration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,

    /// When the entry was written (UTC)
    pub created_at: DateTime<Utc>,

    /// Origin address of the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl AuditLogEntry {
    /// Position of this entry in the log
    pub fn position(&self) -> LogPosition {
        LogPosition {
            created_at: self.created_at,
            sequence: self.sequence,
        }
    }

    /// Whether this entry concerns the given target
    pub fn targets(&self, target_id: &str) -> bool {
        self.target_id.as_deref() == Some(target_id)
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} by {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.actor_id
        );

        if let Some(target) = &self.target_id {
            output.push_str(&format!(" on {}", target));
        }

        if let Some(summary) = summarize_diff(&self.diff) {
            output.push_str(&format!("\n  Changes: {}", summary));
        }

        output
    }
}

/// An entry waiting to be appended
///
/// The store fills in `id`, `sequence` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub actor_id: String,
    pub action: String,
    pub entity_type: Option<EntityType>,
    pub target_id: Option<String>,
    pub diff: Diff,
    pub details: Option<Details>,
    pub ip: Option<String>,
}

impl PendingEntry {
    pub fn new(actor_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            entity_type: None,
            target_id: None,
            diff: Diff::new(),
            details: None,
            ip: None,
        }
    }

    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn target(mut self, target_id: Option<impl Into<String>>) -> Self {
        self.target_id = target_id.map(Into::into);
        self
    }

    pub fn diff(mut self, diff: Diff) -> Self {
        self.diff = diff;
        self
    }

    pub fn details(mut self, details: Option<Details>) -> Self {
        self.details = details;
        self
    }

    pub fn ip(mut self, ip: Option<impl Into<String>>) -> Self {
        self.ip = ip.map(Into::into);
        self
    }

    /// Turn into a stored entry
    pub(crate) fn into_entry(
        self,
        id: LogId,
        sequence: u64,
        created_at: DateTime<Utc>,
    ) -> AuditLogEntry {
        AuditLogEntry {
            id,
            sequence,
            actor_id: self.actor_id,
            action: self.action,
            entity_type: self.entity_type,
            target_id: self.target_id,
            diff: self.diff,
            details: self.details,
            created_at,
            ip: self.ip,
        }
    }
}
