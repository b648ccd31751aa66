//! Point-in-time restoration from the audit log
//!
//! `patch` derives the reverse patch from the entries written after a target
//! entry; `engine` resolves the entity, applies the patch under a version
//! check and records the restoration.

pub mod engine;
pub mod patch;

pub use engine::{RestorationEngine, RestoreDetails, RestoreOutcome, RestorePlan};
pub use patch::{build_reverse_patch, ReversePatch};
