//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`; stdout is left to command
//! output. `RUST_LOG` overrides the filter from settings, and `--verbose`
//! raises the crate's own level to debug.

use tracing_subscriber::EnvFilter;

use crate::error::{AuditError, AuditResult};

/// Filter applied with `--verbose`
pub const VERBOSE_FILTER: &str = "plinkk_audit=debug";

/// Build the filter: `RUST_LOG` if set, else `configured`
pub fn build_filter(configured: &str, verbose: bool) -> AuditResult<EnvFilter> {
    if verbose {
        return EnvFilter::try_new(VERBOSE_FILTER)
            .map_err(|e| AuditError::Config(format!("Invalid log filter: {}", e)));
    }

    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(configured).map_err(|e| {
            AuditError::Config(format!("Invalid log filter '{}': {}", configured, e))
        }),
    }
}

/// Install the global subscriber
pub fn init(configured: &str, verbose: bool) -> AuditResult<()> {
    let filter = build_filter(configured, verbose)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AuditError::Config(format!("Failed to initialize logging: {}", e)))
}
