//! Storage Layer - SQLite-backed persistence
//!
//! Each store owns one table plus the shared ledger:
//! - complaints(id, full_name, gender, complaint_type, priority, status, complain, created_at)
//! - books(id, title, author, publisher, year, isbn, quantity, created_at)
//! - schema_migrations(name, applied_at)

pub mod schema;
pub mod migrate;
pub mod sqlite;

pub use sqlite::{RecordStore, InitReport, StoreStatus};
pub use migrate::{AppliedMigration, ColumnFailure, ReconcileReport};
