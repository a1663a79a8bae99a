//! Table provisioning and additive column reconciliation
//!
//! Every step that changes the schema is recorded in `schema_migrations`
//! and never applied twice. Reconciliation only adds columns.

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::collections::HashSet;

use super::schema::{self, TableSchema};
use crate::{Error, Result};

/// A column that reconciliation could not bring into the live table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnFailure {
    pub column: String,
    pub reason: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub failed: Vec<ColumnFailure>,
}

/// A ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    pub name: String,
    pub applied_at: String,
}

/// Create the migration ledger if missing
pub fn ensure_ledger(conn: &Connection) -> Result<()> {
    conn.execute(schema::CREATE_MIGRATIONS_TABLE, [])?;
    Ok(())
}

/// Check whether a migration step has been recorded
pub fn is_recorded(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM schema_migrations WHERE name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn record(conn: &Connection, name: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (name, applied_at) VALUES (?1, ?2)",
        params![name, schema::now_timestamp()],
    )?;
    Ok(())
}

/// All recorded migrations, oldest first
pub fn applied_migrations(conn: &Connection) -> Result<Vec<AppliedMigration>> {
    let mut stmt = conn.prepare(
        "SELECT name, applied_at FROM schema_migrations ORDER BY applied_at, rowid",
    )?;

    let migrations = stmt
        .query_map([], |row| {
            Ok(AppliedMigration {
                name: row.get(0)?,
                applied_at: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(migrations)
}

/// Column names of the live table, in table order
pub fn live_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Create the base table with its minimal columns and record the step.
pub fn provision_table(conn: &mut Connection, schema: &TableSchema) -> Result<()> {
    let name = schema.create_migration();
    let tx = conn.transaction()?;
    // IF NOT EXISTS keeps this safe when the ledger is newer than the table
    tx.execute(schema.create_sql, [])?;
    if !is_recorded(&tx, &name)? {
        record(&tx, &name)?;
        tracing::debug!("Provisioned table {}", schema.table);
    }
    tx.commit()?;
    Ok(())
}

/// Bring the live table up to the descriptor.
///
/// Columns already present are recorded without being altered. Missing
/// columns are added with their inline default so existing rows stay valid.
/// A failed addition is logged and reported; the pass carries on with the
/// remaining columns.
pub fn reconcile(conn: &mut Connection, schema: &TableSchema) -> Result<ReconcileReport> {
    let live: HashSet<String> = live_columns(conn, schema.table)?.into_iter().collect();
    let mut report = ReconcileReport::default();

    for column in schema.columns {
        let name = schema.add_column_migration(column.name);
        let present = live.contains(column.name);

        if is_recorded(conn, &name)? {
            if !present {
                let err = Error::Schema(format!(
                    "{}.{} is recorded as applied but missing from the live table",
                    schema.table, column.name
                ));
                tracing::warn!("{}", err);
                report.failed.push(ColumnFailure {
                    column: column.name.to_string(),
                    reason: err.to_string(),
                });
            }
            continue;
        }

        if present {
            record(conn, &name)?;
            continue;
        }

        match add_column(conn, schema, column, &name) {
            Ok(()) => {
                tracing::info!("Added missing column: {}.{}", schema.table, column.name);
                report.added.push(column.name.to_string());
            }
            Err(e) => {
                let err = Error::Schema(format!(
                    "failed to add column {}.{}: {}",
                    schema.table, column.name, e
                ));
                tracing::warn!("{}", err);
                report.failed.push(ColumnFailure {
                    column: column.name.to_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok(report)
}

fn add_column(
    conn: &mut Connection,
    schema: &TableSchema,
    column: &schema::ColumnSpec,
    migration: &str,
) -> Result<()> {
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        schema.table,
        column.name,
        column.definition()
    );
    let tx = conn.transaction()?;
    tx.execute(&sql, [])?;
    record(&tx, migration)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{ColumnSpec, SqlType};

    static NOTES_COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::required("title", SqlType::Text),
        ColumnSpec::required("mood", SqlType::Text).with_default("'calm'"),
        ColumnSpec::optional("pages", SqlType::Integer),
    ];

    static NOTES: TableSchema = TableSchema {
        table: "notes",
        create_sql: "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)",
        columns: NOTES_COLUMNS,
    };

    static BROKEN_COLUMNS: &[ColumnSpec] = &[
        ColumnSpec::required("title", SqlType::Text),
        // NOT NULL without a default cannot be added once the table has rows
        ColumnSpec::required("body", SqlType::Text),
        ColumnSpec::optional("tag", SqlType::Text),
    ];

    static BROKEN: TableSchema = TableSchema {
        table: "notes",
        create_sql: "CREATE TABLE IF NOT EXISTS notes (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL)",
        columns: BROKEN_COLUMNS,
    };

    fn ledger_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_ledger(&conn).unwrap();
        conn
    }

    #[test]
    fn test_reconcile_adds_missing_columns_with_defaults() {
        let mut conn = ledger_conn();
        provision_table(&mut conn, &NOTES).unwrap();
        conn.execute("INSERT INTO notes (title) VALUES ('old')", []).unwrap();

        let report = reconcile(&mut conn, &NOTES).unwrap();
        assert_eq!(report.added, vec!["mood".to_string(), "pages".to_string()]);
        assert!(report.failed.is_empty());

        let mood: String = conn
            .query_row("SELECT mood FROM notes WHERE title = 'old'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mood, "calm");
        assert_eq!(live_columns(&conn, "notes").unwrap(), vec!["id", "title", "mood", "pages"]);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut conn = ledger_conn();
        provision_table(&mut conn, &NOTES).unwrap();
        reconcile(&mut conn, &NOTES).unwrap();
        let ledger_before = applied_migrations(&conn).unwrap().len();

        provision_table(&mut conn, &NOTES).unwrap();
        let second = reconcile(&mut conn, &NOTES).unwrap();
        assert!(second.added.is_empty());
        assert!(second.failed.is_empty());
        assert_eq!(applied_migrations(&conn).unwrap().len(), ledger_before);
        assert_eq!(live_columns(&conn, "notes").unwrap().len(), 4);
    }

    #[test]
    fn test_present_columns_are_recorded() {
        let mut conn = ledger_conn();
        provision_table(&mut conn, &NOTES).unwrap();
        reconcile(&mut conn, &NOTES).unwrap();

        assert!(is_recorded(&conn, "notes:create").unwrap());
        assert!(is_recorded(&conn, "notes:add_column:title").unwrap());
        assert!(is_recorded(&conn, "notes:add_column:mood").unwrap());
    }

    #[test]
    fn test_failed_column_is_non_fatal() {
        let mut conn = ledger_conn();
        provision_table(&mut conn, &BROKEN).unwrap();
        conn.execute("INSERT INTO notes (title) VALUES ('old')", []).unwrap();

        let report = reconcile(&mut conn, &BROKEN).unwrap();
        assert_eq!(report.added, vec!["tag".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].column, "body");
        assert!(!is_recorded(&conn, "notes:add_column:body").unwrap());
    }

    #[test]
    fn test_recorded_but_missing_column_is_reported() {
        let mut conn = ledger_conn();
        provision_table(&mut conn, &NOTES).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (name, applied_at) VALUES ('notes:add_column:pages', 'x')",
            [],
        )
        .unwrap();

        let report = reconcile(&mut conn, &NOTES).unwrap();
        assert_eq!(report.added, vec!["mood".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].column, "pages");
        assert!(!live_columns(&conn, "notes").unwrap().contains(&"pages".to_string()));
    }
}
