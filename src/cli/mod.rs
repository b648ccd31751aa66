//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer.

pub mod entity;
pub mod log;

pub use entity::{handle_entity_command, EntityCommands};
pub use log::{handle_log_command, LogCommands};

use clap::Args;
use serde_json::Value;

use crate::error::{AuditError, AuditResult};
use crate::models::{EntityType, Patch};
use crate::services::Actor;

/// Environment variable supplying `--actor`
pub const ACTOR_ENV: &str = "PLINKK_AUDIT_ACTOR";

/// Who is performing a mutation
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Id of the user performing the change
    #[arg(long, env = "PLINKK_AUDIT_ACTOR")]
    pub actor: String,
    /// Origin address of the request
    #[arg(long)]
    pub ip: Option<String>,
}

impl ActorArgs {
    pub fn as_actor(&self) -> Actor<'_> {
        Actor::new(&self.actor, self.ip.as_deref())
    }
}

/// Parse an entity type argument
pub fn parse_entity_type(input: &str) -> AuditResult<EntityType> {
    EntityType::parse(input).ok_or_else(|| {
        AuditError::Validation(format!(
            "Invalid entity type: '{}'. Valid types: user, plinkk, theme, redirect, role",
            input
        ))
    })
}

/// Parse `key=value` assignments into a patch
///
/// Values are read as JSON when they parse (`42`, `true`, `null`, `"x"`,
/// `[1,2]`) and as plain strings otherwise.
pub fn parse_assignments(assignments: &[String]) -> AuditResult<Patch> {
    let mut patch = Patch::new();
    for assignment in assignments {
        let (key, raw) = assignment.split_once('=').ok_or_else(|| {
            AuditError::Validation(format!(
                "Invalid assignment '{}', expected key=value",
                assignment
            ))
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(AuditError::Validation(format!(
                "Missing field name in '{}'",
                assignment
            )));
        }

        let value = serde_json::from_str::<Value>(raw)
            .unwrap_or_else(|_| Value::String(raw.to_string()));
        patch.insert(key.to_string(), value);
    }
    Ok(patch)
}
