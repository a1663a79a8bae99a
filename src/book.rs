//! Library catalog deployment

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::record::{optional_text, require, ColumnName, RecordShape};
use crate::storage::schema::{ColumnSpec, SqlType, TableSchema, EPOCH_DEFAULT};
use crate::{Error, Result};

const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
)
"#;

const BOOK_COLUMNS: &[ColumnSpec] = &[
    ColumnSpec::required("title", SqlType::Text),
    ColumnSpec::required("author", SqlType::Text),
    ColumnSpec::optional("publisher", SqlType::Text),
    ColumnSpec::optional("year", SqlType::Integer),
    ColumnSpec::optional("isbn", SqlType::Text),
    ColumnSpec::required("quantity", SqlType::Integer).with_default("1"),
    ColumnSpec::required("created_at", SqlType::Text).with_default(EPOCH_DEFAULT),
];

static BOOK_SCHEMA: TableSchema = TableSchema {
    table: "books",
    create_sql: CREATE_BOOKS_TABLE,
    columns: BOOK_COLUMNS,
};

/// Searchable book columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookColumn {
    Title,
    Author,
    Publisher,
    Year,
    Isbn,
}

impl ColumnName for BookColumn {
    fn as_str(&self) -> &'static str {
        match self {
            BookColumn::Title => "title",
            BookColumn::Author => "author",
            BookColumn::Publisher => "publisher",
            BookColumn::Year => "year",
            BookColumn::Isbn => "isbn",
        }
    }
}

impl FromStr for BookColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(BookColumn::Title),
            "author" => Ok(BookColumn::Author),
            "publisher" => Ok(BookColumn::Publisher),
            "year" => Ok(BookColumn::Year),
            "isbn" => Ok(BookColumn::Isbn),
            _ => Err(Error::Validation(format!("Unknown book column: {}", s))),
        }
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    /// Copies on hand
    pub quantity: u32,
}

impl Book {
    /// Create a book with a single copy and no optional details
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            publisher: None,
            year: None,
            isbn: None,
            quantity: 1,
        }
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }
}

impl RecordShape for Book {
    type Column = BookColumn;

    fn schema() -> &'static TableSchema {
        &BOOK_SCHEMA
    }

    fn validate(&self) -> Result<()> {
        require("Title", &self.title)?;
        require("Author", &self.author)
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("title", Value::Text(self.title.clone())),
            ("author", Value::Text(self.author.clone())),
            ("publisher", optional_text(&self.publisher)),
            ("year", self.year.map_or(Value::Null, |y| Value::Integer(y as i64))),
            ("isbn", optional_text(&self.isbn)),
            ("quantity", Value::Integer(self.quantity as i64)),
        ]
    }

    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        // Legacy tables allow NULL (and in principle negative) quantities
        let quantity: Option<i64> = row.get("quantity")?;
        Ok(Self {
            title: row.get("title")?,
            author: row.get("author")?,
            publisher: row.get("publisher")?,
            year: row.get("year")?,
            isbn: row.get("isbn")?,
            quantity: quantity.and_then(|q| u32::try_from(q).ok()).unwrap_or(0),
        })
    }

    fn fixtures() -> Vec<Self> {
        vec![
            Book::new("The C Programming Language", "Brian W. Kernighan")
                .with_publisher("Prentice Hall")
                .with_year(1988)
                .with_isbn("9780131103627")
                .with_quantity(3),
            Book::new("Introduction to Algorithms", "Thomas H. Cormen")
                .with_publisher("MIT Press")
                .with_year(2009)
                .with_isbn("9780262033848")
                .with_quantity(5),
            Book::new("Database System Concepts", "Abraham Silberschatz")
                .with_publisher("McGraw-Hill")
                .with_year(2019)
                .with_isbn("9780078022159")
                .with_quantity(4),
            Book::new("Operating System Concepts", "Abraham Silberschatz")
                .with_publisher("Wiley")
                .with_year(2018)
                .with_isbn("9781119456339")
                .with_quantity(2),
            Book::new("Godan", "Munshi Premchand")
                .with_year(1936)
                .with_quantity(6),
            Book::new("Wings of Fire", "A. P. J. Abdul Kalam")
                .with_publisher("Universities Press")
                .with_year(1999)
                .with_isbn("9788173711466"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_required_fields() {
        assert!(Book::new("Godan", "Munshi Premchand").validate().is_ok());
        assert!(matches!(Book::new("", "Munshi Premchand").validate(), Err(Error::Validation(_))));
        assert!(matches!(Book::new("Godan", " ").validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_optional_fields_bind_null() {
        let book = Book::new("Godan", "Munshi Premchand").with_isbn("");
        let values = book.values();
        let lookup = |name: &str| values.iter().find(|(c, _)| *c == name).map(|(_, v)| v.clone());
        assert_eq!(lookup("publisher"), Some(Value::Null));
        assert_eq!(lookup("year"), Some(Value::Null));
        assert_eq!(lookup("isbn"), Some(Value::Null));
        assert_eq!(lookup("quantity"), Some(Value::Integer(1)));
    }

    #[test]
    fn test_column_parsing() {
        assert_eq!("ISBN".parse::<BookColumn>().unwrap(), BookColumn::Isbn);
        assert_eq!(BookColumn::Author.as_str(), "author");
        assert!("price".parse::<BookColumn>().is_err());
    }

    #[test]
    fn test_fixtures_are_valid() {
        let fixtures = Book::fixtures();
        assert!(!fixtures.is_empty());
        assert!(fixtures.iter().all(|b| b.validate().is_ok()));
        for (column, _) in fixtures[0].values() {
            assert!(Book::schema().column(column).is_some());
        }
    }
}
