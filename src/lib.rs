//! plinkk-audit - audit trail and point-in-time restoration
//!
//! Every administrative mutation of a platform entity (users, pages, themes,
//! redirects, roles) is recorded as an append-only, field-level diff. Any
//! entity can later be restored to its state right after a chosen entry.
//!
//! # Architecture
//!
//! - `audit`: diff computation and the append-only log store
//! - `registry`: action classification and per-type entity store lookup
//! - `restore`: reverse patch construction and the restoration engine
//! - `models`: entity records, entity types and log ids
//! - `storage`: JSON file persistence for the reference entity stores
//! - `services`: audited mutations, log queries and restores
//! - `config`: data directory and settings
//! - `cli` / `display`: command handlers and terminal formatting
//! - `logging`: diagnostic output through `tracing`
//!
//! # Example
//!
//! ```rust,ignore
//! use plinkk_audit::config::{AuditPaths, Settings};
//! use plinkk_audit::services::{Actor, AuditService};
//! use plinkk_audit::storage::Storage;
//!
//! let paths = AuditPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths, &settings)?;
//! storage.load_all()?;
//!
//! let outcome = AuditService::new(&storage).restore(log_id, Actor::new("admin", None))?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod registry;
pub mod restore;
pub mod services;
pub mod storage;

pub use error::{AuditError, AuditResult};
