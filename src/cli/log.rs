//! Audit log CLI commands
//!
//! Browsing the trail, classifying actions and restoring entities.

use clap::Subcommand;

use crate::display::{
    format_history, format_log_details, format_log_list, format_restore_outcome, format_restore_plan,
};
use crate::error::{AuditError, AuditResult};
use crate::services::AuditService;
use crate::storage::Storage;

use super::ActorArgs;

/// Audit log subcommands
#[derive(Subcommand)]
pub enum LogCommands {
    /// List recent entries, newest first
    List {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Only entries for this target id
        #[arg(short, long)]
        target: Option<String>,
    },
    /// Show one entry with its full diff
    Show {
        /// Entry id (full, or the short log-xxxxxxxx form)
        id: String,
        /// Print the stored JSON
        #[arg(long)]
        json: bool,
    },
    /// Every entry for one target, newest first
    History {
        /// Target entity id
        target: String,
    },
    /// Restore the entry's target to its state right after the entry
    Restore {
        /// Entry id (full, or the short log-xxxxxxxx form)
        id: String,
        /// Show the reverse patch without applying it
        #[arg(long)]
        dry_run: bool,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Show which entity type an action tag resolves to
    Classify {
        /// Action tag, e.g. UPDATE_USER_PROFILE
        action: String,
    },
}

fn to_json<T: serde::Serialize>(value: &T) -> AuditResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AuditError::Json(format!("Failed to serialize output: {}", e)))
}

/// Handle a log command
pub fn handle_log_command(storage: &Storage, cmd: LogCommands) -> AuditResult<()> {
    let service = AuditService::new(storage);

    match cmd {
        LogCommands::List { limit, target } => {
            let entries = service.recent(limit, target.as_deref())?;
            println!("{}", format_log_list(&entries));
        }

        LogCommands::Show { id, json } => {
            let entry = service.get(&id)?;
            if json {
                println!("{}", to_json(&entry)?);
            } else {
                print!("{}", format_log_details(&entry, service.classify(&entry)));
            }
        }

        LogCommands::History { target } => {
            let entries = service.history(&target)?;
            print!("{}", format_history(&target, &entries));
        }

        LogCommands::Restore {
            id,
            dry_run,
            json,
            actor,
        } => {
            let log_id = service.resolve_id(&id)?;

            if dry_run {
                let plan = service.plan_restore(log_id)?;
                if json {
                    println!("{}", to_json(&plan.reverse.patch)?);
                } else {
                    print!("{}", format_restore_plan(&plan));
                }
                return Ok(());
            }

            let outcome = service.restore(log_id, actor.as_actor())?;
            if json {
                println!("{}", to_json(&outcome)?);
            } else {
                println!("{}", format_restore_outcome(&outcome));
            }
        }

        LogCommands::Classify { action } => {
            match storage.registry().resolve_entity_type(&action) {
                Some(entity_type) => println!("{} -> {}", action.to_uppercase(), entity_type),
                None => {
                    return Err(AuditError::UnresolvedModel(action));
                }
            }
        }
    }

    Ok(())
}
