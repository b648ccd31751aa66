//! Service layer for plinkk-audit
//!
//! Audited entity mutations on top of the storage layer, plus audit log
//! queries and restoration.

pub mod audit;
pub mod entity;

pub use audit::AuditService;
pub use entity::{Actor, EntityService, Mutation};
