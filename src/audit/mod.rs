//! Audit logging system for plinkk-audit
//!
//! Records every mutation as an immutable entry carrying the actor, the action
//! tag, the target entity and a field-level diff.
//!
//! # Architecture
//!
//! - `compute_diff`: pure diff between two flat snapshots, honoring an
//!   exclusion list.
//! - `AuditLogEntry`: one stored entry; `PendingEntry` is what callers build.
//! - `AuditLogStore`: append-only JSONL store. Appends are best-effort and
//!   never fail the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use plinkk_audit::audit::AuditLogStore;
//!
//! let store = AuditLogStore::new(paths.audit_log());
//!
//! // After a mutation, log what changed
//! store.append_detailed(
//!     "admin-1",
//!     "UPDATE_USER_PROFILE",
//!     Some("u-42"),
//!     &before.snapshot(),
//!     &after.snapshot(),
//!     Some("203.0.113.7"),
//!     None,
//! );
//! ```

mod diff;
mod entry;
mod store;

pub use diff::{
    compute_diff, default_excluded_fields, format_value, summarize_diff, Diff, FieldChange,
    DEFAULT_EXCLUDED_FIELDS,
};
pub use entry::{AuditLogEntry, Details, LogPosition, PendingEntry};
pub use store::AuditLogStore;
