//! Configuration module for plinkk-audit
//!
//! - Data directory resolution
//! - Settings persistence (exclusion policy, classification table, log filter)

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::Settings;
