//! Record shapes - the statically typed rows a store manages
//!
//! A deployment hand-writes one struct per table shape and implements
//! [`RecordShape`] for it. The store supplies identity and creation time,
//! wrapping the caller's fields in a [`Record`].

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde::Serialize;

use crate::storage::schema::TableSchema;
use crate::{Error, Result};

/// A column a caller may filter on.
///
/// Implemented by closed per-deployment enums so that only identifiers from
/// a fixed allow-list ever end up in statement text.
pub trait ColumnName: Copy + std::fmt::Debug {
    fn as_str(&self) -> &'static str;
}

/// The caller-owned part of a row: everything except identity and timestamp.
pub trait RecordShape: Sized + Clone {
    /// Searchable columns of this shape
    type Column: ColumnName;

    /// Schema descriptor used to provision and reconcile the table
    fn schema() -> &'static TableSchema;

    /// Check required fields before anything is sent to the database
    fn validate(&self) -> Result<()>;

    /// Column/value pairs for every mutable field, in descriptor order
    fn values(&self) -> Vec<(&'static str, Value)>;

    /// Rebuild the fields from a row selected by column name
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>;

    /// Fixture rows inserted when the table is first found empty
    fn fixtures() -> Vec<Self>;
}

/// A stored record: store-assigned identity and creation time plus fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<T> {
    pub id: i64,
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub fields: T,
}

/// Row selection for [`crate::RecordStore::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter<C> {
    /// Exactly the record with this identity
    Id(i64),
    /// Records whose column contains `pattern` (case-sensitive substring)
    Contains { column: C, pattern: String },
}

impl<C> Filter<C> {
    pub fn contains(column: C, pattern: impl Into<String>) -> Self {
        Filter::Contains {
            column,
            pattern: pattern.into(),
        }
    }
}

/// Reject a required text field that is empty or only whitespace.
pub(crate) fn require(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Optional text is stored as NULL when absent or empty; anything else is
/// bound exactly as given.
pub(crate) fn optional_text(value: &Option<String>) -> Value {
    match value.as_deref() {
        Some(s) if !s.is_empty() => Value::Text(s.to_string()),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_blank() {
        assert!(require("Name", "Aman").is_ok());
        assert!(matches!(require("Name", ""), Err(Error::Validation(_))));
        assert!(matches!(require("Name", "   \n"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_optional_text_maps_empty_to_null() {
        assert_eq!(optional_text(&None), Value::Null);
        assert_eq!(optional_text(&Some(String::new())), Value::Null);
        assert_eq!(
            optional_text(&Some(" Penguin ".to_string())),
            Value::Text(" Penguin ".to_string())
        );
    }
}
