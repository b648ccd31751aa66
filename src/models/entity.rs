//! Generic entity record
//!
//! The audit engine never inspects an entity's schema. Every persisted record
//! is a flat JSON object plus the bookkeeping needed for optimistic
//! concurrency (`version`) and the timestamps the diff policy excludes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Flat key/value view of an entity at one point in time
pub type Snapshot = Map<String, Value>;

/// Field/value map written back to an entity
pub type Patch = Map<String, Value>;

/// Field names the record manages itself; callers may not set them
pub const RESERVED_FIELDS: [&str; 4] = ["id", "version", "createdAt", "updatedAt"];

/// A persisted entity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Identifier, unique within the entity type
    pub id: String,

    /// Incremented on every successful update, starting at 1
    pub version: u64,

    /// Entity fields
    #[serde(default)]
    pub fields: Map<String, Value>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl EntityRecord {
    /// Create a new record at version 1
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            version: 1,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot used for diffing: the fields plus both timestamps
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = self.fields.clone();
        snapshot.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339()),
        );
        snapshot.insert(
            "updatedAt".to_string(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        snapshot
    }

    /// Write every patch value into the fields, bump the version and touch `updated_at`
    pub fn apply_patch(&mut self, patch: &Patch) {
        for (field, value) in patch {
            self.fields.insert(field.clone(), value.clone());
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Get a single field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.id.trim().is_empty() {
            return Err(EntityValidationError::EmptyId);
        }

        if let Some(field) = self
            .fields
            .keys()
            .find(|k| RESERVED_FIELDS.contains(&k.as_str()))
        {
            return Err(EntityValidationError::ReservedField(field.clone()));
        }

        Ok(())
    }
}

/// Validation errors for entity records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    EmptyId,
    ReservedField(String),
}

impl fmt::Display for EntityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Entity id cannot be empty"),
            Self::ReservedField(field) => {
                write!(f, "Field '{}' is managed by the store and cannot be set", field)
            }
        }
    }
}

impl std::error::Error for EntityValidationError {}
