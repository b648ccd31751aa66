//! Entity CLI commands
//!
//! Audited create/update/delete on the reference entity stores.

use clap::Subcommand;

use crate::display::{format_entity_details, format_entity_list};
use crate::error::AuditResult;
use crate::services::{EntityService, Mutation};
use crate::storage::Storage;

use super::{parse_assignments, parse_entity_type, ActorArgs};

/// Entity subcommands
#[derive(Subcommand)]
pub enum EntityCommands {
    /// Create a record
    Create {
        /// Entity type (user, plinkk, theme, redirect, role)
        entity_type: String,
        /// Record id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        /// Field assignment, repeatable (key=value, value parsed as JSON when possible)
        #[arg(short, long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Update fields of a record
    Update {
        /// Entity type
        entity_type: String,
        /// Record id
        id: String,
        /// Field assignment, repeatable
        #[arg(short, long = "set", value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,
        /// Action tag to record instead of UPDATE_<TYPE>
        #[arg(long)]
        action: Option<String>,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Delete a record
    Delete {
        /// Entity type
        entity_type: String,
        /// Record id
        id: String,
        #[command(flatten)]
        actor: ActorArgs,
    },
    /// Show a record
    Show {
        /// Entity type
        entity_type: String,
        /// Record id
        id: String,
    },
    /// List records of a type
    List {
        /// Entity type
        entity_type: String,
    },
}

fn print_audit_line(mutation: &Mutation) {
    match &mutation.audit_entry {
        Some(entry) => println!("  Audit: {} ({})", entry.id, entry.action),
        None => println!("  Audit: no tracked changes"),
    }
}

/// Handle an entity command
pub fn handle_entity_command(storage: &Storage, cmd: EntityCommands) -> AuditResult<()> {
    let service = EntityService::new(storage);

    match cmd {
        EntityCommands::Create {
            entity_type,
            id,
            set,
            actor,
        } => {
            let entity_type = parse_entity_type(&entity_type)?;
            let fields = parse_assignments(&set)?;
            let created = service.create(entity_type, id.as_deref(), fields, actor.as_actor())?;

            println!("Created {}: {}", entity_type, created.record.id);
            print_audit_line(&created);
        }

        EntityCommands::Update {
            entity_type,
            id,
            set,
            action,
            actor,
        } => {
            let entity_type = parse_entity_type(&entity_type)?;
            let patch = parse_assignments(&set)?;
            let updated = service.update(
                entity_type,
                &id,
                &patch,
                action.as_deref(),
                actor.as_actor(),
            )?;

            println!(
                "Updated {}: {} (version {})",
                entity_type, updated.record.id, updated.record.version
            );
            print_audit_line(&updated);
        }

        EntityCommands::Delete {
            entity_type,
            id,
            actor,
        } => {
            let entity_type = parse_entity_type(&entity_type)?;
            let deleted = service.delete(entity_type, &id, actor.as_actor())?;

            println!("Deleted {}: {}", entity_type, deleted.record.id);
            print_audit_line(&deleted);
        }

        EntityCommands::Show { entity_type, id } => {
            let entity_type = parse_entity_type(&entity_type)?;
            let record = service.find(entity_type, &id)?;
            print!("{}", format_entity_details(entity_type, &record));
        }

        EntityCommands::List { entity_type } => {
            let entity_type = parse_entity_type(&entity_type)?;
            let records = service.list(entity_type)?;
            println!("{}", format_entity_list(entity_type, &records));
        }
    }

    Ok(())
}
