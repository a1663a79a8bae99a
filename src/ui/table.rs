use tabled::{settings::Style, Table, Tabled};

use crate::storage::AppliedMigration;
use crate::{Book, Complaint, Record};

const TEXT_WIDTH: usize = 48;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct ComplaintRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Full Name")]
    full_name: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Type")]
    complaint_type: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Complain")]
    complain: String,
    #[tabled(rename = "Created At")]
    created_at: String,
}

impl From<&Record<Complaint>> for ComplaintRow {
    fn from(record: &Record<Complaint>) -> Self {
        let c = &record.fields;
        Self {
            id: record.id,
            full_name: c.full_name.clone(),
            gender: c.gender.clone(),
            complaint_type: c.complaint_type.clone(),
            priority: c.priority.clone(),
            status: c.status.clone(),
            complain: truncate(&c.complain, TEXT_WIDTH),
            created_at: record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
struct BookRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Publisher")]
    publisher: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "ISBN")]
    isbn: String,
    #[tabled(rename = "Quantity")]
    quantity: u32,
}

impl From<&Record<Book>> for BookRow {
    fn from(record: &Record<Book>) -> Self {
        let b = &record.fields;
        Self {
            id: record.id,
            title: truncate(&b.title, TEXT_WIDTH),
            author: b.author.clone(),
            publisher: b.publisher.clone().unwrap_or_default(),
            year: b.year.map(|y| y.to_string()).unwrap_or_default(),
            isbn: b.isbn.clone().unwrap_or_default(),
            quantity: b.quantity,
        }
    }
}

#[derive(Tabled)]
struct MigrationRow {
    #[tabled(rename = "Migration")]
    name: String,
    #[tabled(rename = "Applied At")]
    applied_at: String,
}

pub fn complaints_table(records: &[Record<Complaint>]) -> String {
    let rows: Vec<ComplaintRow> = records.iter().map(ComplaintRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn books_table(records: &[Record<Book>]) -> String {
    let rows: Vec<BookRow> = records.iter().map(BookRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn migrations_table(migrations: &[AppliedMigration]) -> String {
    let rows: Vec<MigrationRow> = migrations
        .iter()
        .map(|m| MigrationRow {
            name: m.name.clone(),
            applied_at: m.applied_at.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Shorten long free text for a table cell, on a char boundary
fn truncate(text: &str, width: usize) -> String {
    let text = text.replace('\n', " ");
    if text.chars().count() <= width {
        return text;
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComplaintType, Gender, Priority};
    use chrono::NaiveDate;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        let long = truncate(&"x".repeat(60), 10);
        assert_eq!(long.chars().count(), 10);
        assert!(long.ends_with('…'));
    }

    #[test]
    fn test_complaints_table_renders_headers_and_values() {
        let record = Record {
            id: 19,
            created_at: NaiveDate::from_ymd_opt(2025, 3, 1)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            fields: Complaint::new("Aman Sharma", Gender::Male, ComplaintType::Hostel, Priority::Medium, "Bathroom not cleaned"),
        };
        let rendered = complaints_table(&[record]);
        assert!(rendered.contains("Full Name"));
        assert!(rendered.contains("Aman Sharma"));
        assert!(rendered.contains("Hostel Issue"));
        assert!(rendered.contains("2025-03-01 10:30:00"));
    }

    #[test]
    fn test_stats_table() {
        assert!(stats_table(&[]).is_empty());
        let rendered = stats_table(&[("Rows", "18")]);
        assert!(rendered.contains("Metric"));
        assert!(rendered.contains("18"));
    }
}
