use anyhow::Context;
use std::path::Path;

use crate::{BookAction, BookEdit, ComplaintAction, Deployment};
use formstore::config::{self, FormstoreConfig, StoreConfig};
use formstore::output::{emit_success, OutputMode};
use formstore::ui::{self, Icons};
use formstore::{Book, Complaint, Filter, Record, RecordShape, RecordStore};

fn open_store<T: RecordShape>(config: &StoreConfig) -> anyhow::Result<RecordStore<T>> {
    let store = RecordStore::<T>::open(config)
        .with_context(|| format!("could not initialize database {}", config.database.display()))?;
    if store.init_report().is_degraded() {
        ui::warn(&format!(
            "{} is missing columns; some operations may fail (see `formstore status`)",
            store.table()
        ));
    }
    Ok(store)
}

fn selection<C>(id: Option<i64>, search: Option<String>, field: C) -> Option<Filter<C>> {
    match (id, search) {
        (Some(id), _) => Some(Filter::Id(id)),
        (None, Some(pattern)) if !pattern.trim().is_empty() => {
            Some(Filter::contains(field, pattern.trim()))
        }
        _ => None,
    }
}

/// Form input is trimmed here; the store keeps text as given
fn clean(text: String) -> String {
    text.trim().to_string()
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(clean)
}

fn apply_book_edit(fields: &mut Book, edit: BookEdit) {
    if let Some(title) = edit.title {
        fields.title = clean(title);
    }
    if let Some(author) = edit.author {
        fields.author = clean(author);
    }
    if let Some(publisher) = edit.publisher {
        fields.publisher = Some(clean(publisher));
    }
    if edit.clear_year {
        fields.year = None;
    } else if let Some(year) = edit.year {
        fields.year = Some(year);
    }
    if let Some(isbn) = edit.isbn {
        fields.isbn = Some(clean(isbn));
    }
    if let Some(quantity) = edit.quantity {
        fields.quantity = quantity;
    }
}

fn fetch_existing<T: RecordShape>(store: &mut RecordStore<T>, id: i64) -> anyhow::Result<Record<T>> {
    store
        .get(id)?
        .ok_or_else(|| formstore::Error::NotFound(id).into())
}

pub fn run_init(path: &Path, force: bool, mode: OutputMode) -> anyhow::Result<()> {
    let defaults = FormstoreConfig::with_defaults();
    config::write_config(path, &defaults, force)?;

    if mode.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        ui::info("complaints", &defaults.complaints_store().database.display().to_string());
        ui::info("books", &defaults.books_store().database.display().to_string());
    } else {
        emit_success(mode, "init", serde_json::json!({ "config": path.display().to_string() }))?;
    }
    Ok(())
}

pub fn run_status(
    settings: &FormstoreConfig,
    deployment: Option<Deployment>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let targets: Vec<Deployment> = match deployment {
        Some(d) => vec![d],
        None => vec![Deployment::Complaints, Deployment::Books],
    };

    if mode.is_human() {
        ui::header(Icons::DATABASE, "Formstore status");
    }

    let mut reports = Vec::new();
    for target in targets {
        let (status, init) = match target {
            Deployment::Complaints => {
                let store = open_store::<Complaint>(&settings.complaints_store())?;
                (store.status()?, store.init_report().clone())
            }
            Deployment::Books => {
                let store = open_store::<Book>(&settings.books_store())?;
                (store.status()?, store.init_report().clone())
            }
        };

        if mode.is_human() {
            ui::section(&format!(" {} {} ", Icons::STATS, status.table));
            let rows = status.rows.to_string();
            let columns = status.columns.join(", ");
            let migrations = status.migrations.len().to_string();
            println!(
                "{}",
                ui::stats_table(&[
                    ("Database", status.database.as_str()),
                    ("Rows", rows.as_str()),
                    ("Columns", columns.as_str()),
                    ("Migrations", migrations.as_str()),
                ])
            );
            for missing in &status.missing_columns {
                ui::warn(&format!("missing column: {}", missing));
            }
            for failure in &init.columns_failed {
                ui::warn(&failure.reason);
            }
            if !status.migrations.is_empty() {
                println!("{}", ui::migrations_table(&status.migrations));
            }
        }
        reports.push(serde_json::json!({ "status": status, "init": init }));
    }

    emit_success(mode, "status", reports)
}

pub fn run_complaints(config: &StoreConfig, action: ComplaintAction, mode: OutputMode) -> anyhow::Result<()> {
    let mut store = open_store::<Complaint>(config)?;

    match action {
        ComplaintAction::Add { name, gender, complaint_type, priority, text } => {
            let complaint = Complaint::new(clean(name), gender, complaint_type, priority, clean(text));
            let id = store.create(&complaint)?;
            if mode.is_human() {
                ui::success(&format!("Complaint submitted (ID: {})", id));
            }
            emit_success(mode, "complaints.add", serde_json::json!({ "id": id }))?;
        }

        ComplaintAction::List { search, field, id } => {
            let filter = selection(id, search, field);
            let records = store.read(filter.as_ref())?;
            if mode.is_human() {
                print_records(&records, Icons::COMPLAINT, "complaints", ui::complaints_table);
            }
            emit_success(mode, "complaints.list", &records)?;
        }

        ComplaintAction::Edit { id, name, gender, complaint_type, priority, status, text } => {
            let mut fields = fetch_existing(&mut store, id)?.fields;
            if let Some(name) = name {
                fields.full_name = clean(name);
            }
            if let Some(gender) = gender {
                fields.gender = gender.to_string();
            }
            if let Some(kind) = complaint_type {
                fields.complaint_type = kind.to_string();
            }
            if let Some(priority) = priority {
                fields.priority = priority.to_string();
            }
            if let Some(status) = status {
                fields.status = status.to_string();
            }
            if let Some(text) = text {
                fields.complain = clean(text);
            }

            store.update(id, &fields)?;
            if mode.is_human() {
                ui::success(&format!("Complaint {} updated", id));
            }
            emit_success(mode, "complaints.edit", serde_json::json!({ "id": id }))?;
        }

        ComplaintAction::Delete { id } => {
            store.delete(id)?;
            if mode.is_human() {
                ui::status(Icons::DEL, "Deleted complaint", &id.to_string());
            }
            emit_success(mode, "complaints.delete", serde_json::json!({ "id": id }))?;
        }
    }

    Ok(())
}

pub fn run_books(config: &StoreConfig, action: BookAction, mode: OutputMode) -> anyhow::Result<()> {
    let mut store = open_store::<Book>(config)?;

    match action {
        BookAction::Add { title, author, publisher, year, isbn, quantity } => {
            let book = Book {
                title: clean(title),
                author: clean(author),
                publisher: clean_optional(publisher),
                year,
                isbn: clean_optional(isbn),
                quantity,
            };
            let id = store.create(&book)?;
            if mode.is_human() {
                ui::success(&format!("Book added (ID: {})", id));
            }
            emit_success(mode, "books.add", serde_json::json!({ "id": id }))?;
        }

        BookAction::List { search, field, id } => {
            let filter = selection(id, search, field);
            let records = store.read(filter.as_ref())?;
            if mode.is_human() {
                print_records(&records, Icons::BOOK, "books", ui::books_table);
            }
            emit_success(mode, "books.list", &records)?;
        }

        BookAction::Edit(edit) => {
            let id = edit.id;
            let mut fields = fetch_existing(&mut store, id)?.fields;
            apply_book_edit(&mut fields, edit);

            store.update(id, &fields)?;
            if mode.is_human() {
                ui::success(&format!("Book {} updated", id));
            }
            emit_success(mode, "books.edit", serde_json::json!({ "id": id }))?;
        }

        BookAction::Delete { id } => {
            store.delete(id)?;
            if mode.is_human() {
                ui::status(Icons::DEL, "Deleted book", &id.to_string());
            }
            emit_success(mode, "books.delete", serde_json::json!({ "id": id }))?;
        }
    }

    Ok(())
}

fn print_records<T>(records: &[Record<T>], icon: &str, noun: &str, render: fn(&[Record<T>]) -> String) {
    if records.is_empty() {
        println!("{} No {} found.", Icons::EMPTY, noun);
        return;
    }
    println!("{}", render(records));
    ui::status(icon, "Loaded", &format!("{} {}", records.len(), noun));
}
