//! Display formatting for terminal output
//!
//! Tables for list views, aligned key/value blocks for detail views.

pub mod entity;
pub mod log;

pub use entity::{format_entity_details, format_entity_list};
pub use log::{format_history, format_log_details, format_log_list, format_restore_outcome, format_restore_plan};
