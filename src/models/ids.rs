//! Strongly-typed identifier for audit log entries
//!
//! Entity ids are owned by the persistence layer and stay plain strings;
//! log ids are generated here and wrap a UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const LOG_ID_PREFIX: &str = "log-";

/// Identifier of a single audit log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(Uuid);

impl LogId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parse an ID from a string, with or without the `log-` prefix
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        let s = s.trim();
        let s = s.strip_prefix(LOG_ID_PREFIX).unwrap_or(s);
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Short form for tables (`log-` plus the first 8 hex digits)
    pub fn short(&self) -> String {
        format!("{}{}", LOG_ID_PREFIX, &self.0.to_string()[..8])
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for LogId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for LogId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_id_creation() {
        let id = LogId::new();
        assert!(!id.as_uuid().is_nil());
        assert_ne!(id, LogId::new());
    }

    #[test]
    fn test_display_parses_back() {
        let id = LogId::new();
        let parsed: LogId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_with_prefix() {
        let uuid_str = "550e8400-e29b-41d4-a716-446655440000";
        let id = LogId::parse(&format!("log-{}", uuid_str)).unwrap();
        assert_eq!(id.as_uuid().to_string(), uuid_str);
        assert_eq!(id.short(), "log-550e8400");
    }

    #[test]
    fn test_serialization_is_transparent() {
        let id = LogId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
    }

    #[test]
    fn test_invalid_id() {
        assert!(LogId::parse("not-a-uuid").is_err());
    }
}
