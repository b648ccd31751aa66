//! Path management for plinkk-audit
//!
//! ## Path Resolution Order
//!
//! 1. `PLINKK_AUDIT_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories`
//!    (e.g. `~/.local/share/plinkk-audit` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::AuditError;
use crate::models::EntityType;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "PLINKK_AUDIT_DATA_DIR";

/// Manages all paths used by plinkk-audit
#[derive(Debug, Clone)]
pub struct AuditPaths {
    /// Base directory for all data
    base_dir: PathBuf,
}

impl AuditPaths {
    /// Resolve the base directory from the environment or the platform default
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, AuditError> {
        let base_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(custom) if !custom.trim().is_empty() => PathBuf::from(custom),
            _ => ProjectDirs::from("", "", "plinkk-audit")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| {
                    AuditError::Config("Could not determine a data directory".into())
                })?,
        };

        Ok(Self { base_dir })
    }

    /// Create paths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the entity data directory
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the records file of an entity type
    pub fn entity_file(&self, entity_type: EntityType) -> PathBuf {
        self.data_dir()
            .join(format!("{}.json", entity_type.file_stem()))
    }

    /// Ensure the base and data directories exist
    pub fn ensure_directories(&self) -> Result<(), AuditError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| AuditError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| AuditError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if the settings file has been written
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
