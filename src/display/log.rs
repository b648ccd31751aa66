//! Audit log display formatting
//!
//! Formats audit entries and restoration results for terminal output.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::{format_value, AuditLogEntry};
use crate::models::EntityType;
use crate::restore::{RestoreDetails, RestoreOutcome, RestorePlan};

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Changed")]
    changed: String,
}

impl From<&AuditLogEntry> for LogRow {
    fn from(entry: &AuditLogEntry) -> Self {
        Self {
            id: entry.id.short(),
            when: entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            actor: entry.actor_id.clone(),
            action: entry.action.clone(),
            target: entry.target_id.clone().unwrap_or_else(|| "-".to_string()),
            changed: entry.diff.keys().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Format entries as a table
pub fn format_log_list(entries: &[AuditLogEntry]) -> String {
    if entries.is_empty() {
        return "No audit entries found.".to_string();
    }

    let rows: Vec<LogRow> = entries.iter().map(LogRow::from).collect();
    let mut output = Table::new(rows).with(Style::psql()).to_string();
    output.push_str(&format!("\n{} entries\n", entries.len()));
    output
}

/// Format a target's history as a timeline, one block per entry
pub fn format_history(target_id: &str, entries: &[AuditLogEntry]) -> String {
    if entries.is_empty() {
        return format!("No audit entries for {}.", target_id);
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&entry.id.short());
        output.push(' ');
        output.push_str(&entry.format_human_readable());
        output.push('\n');
    }
    output.push_str(&format!("{} entries\n", entries.len()));
    output
}

/// Format a single entry with its full diff
///
/// `resolved` is the entity type the entry would be restored as.
pub fn format_log_details(entry: &AuditLogEntry, resolved: Option<EntityType>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Audit entry: {}\n", entry.id));
    output.push_str(&format!("  Sequence:   {}\n", entry.sequence));
    output.push_str(&format!(
        "  When:       {}\n",
        entry.created_at.format("%Y-%m-%d %H:%M:%S%.3f UTC")
    ));
    output.push_str(&format!("  Actor:      {}\n", entry.actor_id));
    if let Some(ip) = &entry.ip {
        output.push_str(&format!("  IP:         {}\n", ip));
    }
    output.push_str(&format!("  Action:     {}\n", entry.action));
    output.push_str(&format!(
        "  Target:     {}\n",
        entry.target_id.as_deref().unwrap_or("-")
    ));
    output.push_str(&format!(
        "  Entity:     {}\n",
        match resolved {
            Some(t) => t.to_string(),
            None => "unresolved".to_string(),
        }
    ));

    if entry.diff.is_empty() {
        output.push_str("\nNo field changes recorded.\n");
    } else {
        output.push_str("\nChanges:\n");
        let width = entry.diff.keys().map(|k| k.len()).max().unwrap_or(0);
        for (field, change) in &entry.diff {
            output.push_str(&format!(
                "  {:<width$}  {} -> {}\n",
                field,
                format_value(&change.old),
                format_value(&change.new),
                width = width
            ));
        }
    }

    if let Some(restore) = RestoreDetails::from_entry(entry) {
        output.push_str(&format!(
            "\nRestored to {} ({} entries reverted): {}\n",
            restore.restored_to_log_id.short(),
            restore.reverted_logs_count,
            restore.reverted_fields.join(", ")
        ));
    } else if let Some(details) = &entry.details {
        output.push_str("\nDetails:\n");
        for (key, value) in details {
            output.push_str(&format!("  {}: {}\n", key, value));
        }
    }

    output
}

/// Format what a restoration would change
pub fn format_restore_plan(plan: &RestorePlan) -> String {
    let mut output = format!(
        "Restore {} {} to entry {}\n",
        plan.entity_type,
        plan.target_id,
        plan.target.id.short()
    );

    if plan.reverse.is_empty() {
        output.push_str("  Nothing changed after this entry.\n");
        return output;
    }

    output.push_str(&format!(
        "  {} later entries, {} contribute\n",
        plan.subsequent.len(),
        plan.reverse.contributing_entries
    ));
    if plan.base_version.is_none() {
        output.push_str("  The entity no longer exists; the restore would fail.\n");
    }
    for (field, value) in &plan.reverse.patch {
        output.push_str(&format!("  {} = {}\n", field, format_value(value)));
    }
    output
}

/// Format the result of a restoration
pub fn format_restore_outcome(outcome: &RestoreOutcome) -> String {
    if !outcome.restored {
        return "Nothing to restore: no changes after this entry.".to_string();
    }

    let mut output = format!(
        "Restored {} field(s) from {} entries: {}",
        outcome.reverted_fields.as_ref().map_or(0, Vec::len),
        outcome.reverted_count.unwrap_or(0),
        outcome
            .reverted_fields
            .as_deref()
            .unwrap_or_default()
            .join(", ")
    );
    match outcome.restoration_log_id {
        Some(id) => output.push_str(&format!("\nRecorded as {}", id)),
        None => output.push_str("\nWarning: the restoration could not be recorded in the audit log"),
    }
    output
}
