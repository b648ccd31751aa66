//! Core data models for plinkk-audit
//!
//! Log identifiers, the closed set of entity types, and the type-erased
//! entity record the restoration engine writes patches into.

pub mod entity;
pub mod entity_type;
pub mod ids;

pub use entity::{EntityRecord, EntityValidationError, Patch, Snapshot};
pub use entity_type::EntityType;
pub use ids::LogId;
