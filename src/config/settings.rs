//! Persisted settings for plinkk-audit
//!
//! Holds the diff exclusion policy, the action classification table and the
//! default log filter. Every field has a serde default, so a partial
//! `config.json` only overrides what it names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::paths::AuditPaths;
use crate::audit::default_excluded_fields;
use crate::error::AuditError;
use crate::registry::{default_rules, ActionClassifier, ClassificationRule};
use crate::storage::write_json_atomic;

/// Settings for plinkk-audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Fields never recorded in diffs, added to the built-in credential and
    /// timestamp fields
    #[serde(default = "default_excluded_fields")]
    pub excluded_fields: BTreeSet<String>,

    /// Ordered action classification table, first match wins
    #[serde(default = "default_rules")]
    pub classification_rules: Vec<ClassificationRule>,

    /// `tracing` filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_filter() -> String {
    "plinkk_audit=warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            excluded_fields: default_excluded_fields(),
            classification_rules: default_rules(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Classifier built from the configured rule table
    pub fn classifier(&self) -> ActionClassifier {
        ActionClassifier::new(self.classification_rules.clone())
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| AuditError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                AuditError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityType;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert!(settings.excluded_fields.contains("password"));
        assert!(settings.excluded_fields.contains("updatedAt"));
        assert_eq!(settings.classification_rules.len(), 5);
    }

    #[test]
    fn test_load_without_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!paths.settings_file().exists());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.excluded_fields.insert("apiKey".into());
        settings.log_filter = "plinkk_audit=debug".into();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(
            paths.settings_file(),
            r#"{"classificationRules": [{"entityType": "ROLE", "keywords": ["ROLE"]}]}"#,
        )
        .unwrap();

        let settings = Settings::load_or_create(&paths).unwrap();
        assert_eq!(settings.excluded_fields, default_excluded_fields());
        assert_eq!(
            settings.classifier().classify("UPDATE_USER_ROLE"),
            Some(EntityType::Role)
        );
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "{ not json").unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
