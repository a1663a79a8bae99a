//! # Formstore - Self-provisioning record store for form applications
//!
//! Formstore owns one SQLite table per deployment and guarantees it is usable
//! before any caller touches it.
//!
//! Formstore provides:
//! - Schema descriptors for each record shape (complaints, library books)
//! - Additive column reconciliation recorded in a migration ledger
//! - Fixture seeding for freshly created, empty tables
//! - Create/read/update/delete/search over statically typed records

pub mod record;
pub mod complaint;
pub mod book;
pub mod storage;
pub mod config;
pub mod output;
pub mod ui;


// Re-exports for convenient access
pub use record::{Filter, Record, RecordShape, ColumnName};
pub use complaint::{Complaint, ComplaintColumn, ComplaintStatus, ComplaintType, Gender, Priority};
pub use book::{Book, BookColumn};
pub use storage::{RecordStore, InitReport, StoreStatus};
pub use config::StoreConfig;

/// Result type alias for Formstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Formstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
