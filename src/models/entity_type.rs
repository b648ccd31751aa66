//! Entity types whose mutations are audited and can be restored

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of restorable entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    User,
    Plinkk,
    Theme,
    Redirect,
    Role,
}

impl EntityType {
    /// All entity types, in registration order
    pub const ALL: [EntityType; 5] = [
        EntityType::User,
        EntityType::Plinkk,
        EntityType::Theme,
        EntityType::Redirect,
        EntityType::Role,
    ];

    /// Uppercase tag used in action names (`RESTORE_USER`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "USER",
            EntityType::Plinkk => "PLINKK",
            EntityType::Theme => "THEME",
            EntityType::Redirect => "REDIRECT",
            EntityType::Role => "ROLE",
        }
    }

    /// Parse an entity type (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "USER" | "USERS" => Some(EntityType::User),
            "PLINKK" | "PLINKKS" => Some(EntityType::Plinkk),
            "THEME" | "THEMES" => Some(EntityType::Theme),
            "REDIRECT" | "REDIRECTS" => Some(EntityType::Redirect),
            "ROLE" | "ROLES" => Some(EntityType::Role),
            _ => None,
        }
    }

    /// File stem used by the JSON entity store
    pub fn file_stem(&self) -> &'static str {
        match self {
            EntityType::User => "users",
            EntityType::Plinkk => "plinkks",
            EntityType::Theme => "themes",
            EntityType::Redirect => "redirects",
            EntityType::Role => "roles",
        }
    }

    /// Action tag written when an entry of this type is restored
    pub fn restore_action(&self) -> String {
        format!("RESTORE_{}", self.as_str())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
