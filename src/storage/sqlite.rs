//! SQLite storage implementation

use std::collections::HashSet;
use std::marker::PhantomData;
use std::time::Duration;

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use super::migrate::{self, AppliedMigration, ColumnFailure};
use super::schema::{self, CREATED_AT};
use crate::config::{self, StoreConfig};
use crate::record::{ColumnName, Filter, Record, RecordShape};
use crate::{Error, Result};

/// What happened while a store was being opened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub container_created: bool,
    pub columns_added: Vec<String>,
    pub columns_failed: Vec<ColumnFailure>,
    pub seeded: usize,
}

impl InitReport {
    /// True when reconciliation left the table short of its descriptor
    pub fn is_degraded(&self) -> bool {
        !self.columns_failed.is_empty()
    }
}

/// Snapshot of a store's table for status views
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub table: &'static str,
    pub database: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub missing_columns: Vec<&'static str>,
    pub migrations: Vec<AppliedMigration>,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Table {} ({}):", self.table, self.database)?;
        writeln!(f, "  Rows: {}", self.rows)?;
        writeln!(f, "  Columns: {}", self.columns.join(", "))?;
        if !self.missing_columns.is_empty() {
            writeln!(f, "  Missing: {}", self.missing_columns.join(", "))?;
        }
        write!(f, "  Migrations: {}", self.migrations.len())
    }
}

/// SQLite-backed store for one table of `T` records
pub struct RecordStore<T: RecordShape> {
    conn: Connection,
    database: String,
    report: InitReport,
    select_sql: String,
    _shape: PhantomData<T>,
}

impl<T: RecordShape> RecordStore<T> {
    /// Open the store, provisioning and reconciling its table.
    ///
    /// Only a failure to connect is fatal. A container that cannot be
    /// created and columns that cannot be added are logged and reported
    /// through [`RecordStore::init_report`].
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let schema = T::schema();

        let container_created = if config.is_in_memory() {
            false
        } else {
            match config::ensure_container(&config.database) {
                Ok(created) => created,
                Err(e) => {
                    tracing::warn!(
                        "Could not create database directory for {}: {}",
                        config.database.display(),
                        e
                    );
                    false
                }
            }
        };

        let mut conn = connect(config)?;
        migrate::ensure_ledger(&conn)?;
        migrate::provision_table(&mut conn, schema)?;
        let reconciled = migrate::reconcile(&mut conn, schema)?;

        let mut store = Self {
            conn,
            database: config.database.display().to_string(),
            report: InitReport {
                container_created,
                columns_added: reconciled.added,
                columns_failed: reconciled.failed,
                seeded: 0,
            },
            select_sql: select_sql(schema),
            _shape: PhantomData,
        };

        if config.seed && store.count()? == 0 {
            store.report.seeded = store.seed()?;
        }

        Ok(store)
    }

    pub fn init_report(&self) -> &InitReport {
        &self.report
    }

    pub fn table(&self) -> &'static str {
        T::schema().table
    }

    // ========== Record Operations ==========

    /// Insert a record and return its store-assigned identity
    pub fn create(&mut self, fields: &T) -> Result<i64> {
        fields.validate()?;

        let mut values = fields.values();
        values.push((CREATED_AT, Value::Text(schema::now_timestamp())));
        let sql = insert_sql(T::schema().table, values.iter().map(|(c, _)| *c));

        let tx = self.conn.transaction()?;
        tx.execute(&sql, params_from_iter(values.iter().map(|(_, v)| v)))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!("Created {} record {}", T::schema().table, id);
        Ok(id)
    }

    /// Records matching `filter`, most recently created first.
    ///
    /// No match is an empty vector, not an error.
    pub fn read(&mut self, filter: Option<&Filter<T::Column>>) -> Result<Vec<Record<T>>> {
        let (clause, param) = match filter {
            None => (String::new(), None),
            Some(Filter::Id(id)) => (" WHERE id = ?1".to_string(), Some(Value::Integer(*id))),
            Some(Filter::Contains { column, pattern }) => (
                // instr is case-sensitive, unlike LIKE
                format!(" WHERE instr(CAST({} AS TEXT), ?1) > 0", column.as_str()),
                Some(Value::Text(pattern.clone())),
            ),
        };
        let sql = format!("{}{} ORDER BY {} DESC, id DESC", self.select_sql, clause, CREATED_AT);

        let tx = self.conn.transaction()?;
        let records = {
            let mut stmt = tx.prepare(&sql)?;
            stmt.query_map(params_from_iter(param.iter()), row_to_record::<T>)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };
        tx.commit()?;

        Ok(records)
    }

    /// Look up a single record by identity
    pub fn get(&mut self, id: i64) -> Result<Option<Record<T>>> {
        Ok(self.read(Some(&Filter::Id(id)))?.into_iter().next())
    }

    /// Overwrite every mutable field; identity and creation time are kept
    pub fn update(&mut self, id: i64, fields: &T) -> Result<()> {
        fields.validate()?;

        let values = fields.values();
        let assignments: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            T::schema().table,
            assignments.join(", "),
            values.len() + 1
        );

        let id_value = Value::Integer(id);
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            &sql,
            params_from_iter(values.iter().map(|(_, v)| v).chain(std::iter::once(&id_value))),
        )?;
        if affected == 0 {
            return Err(Error::NotFound(id));
        }
        tx.commit()?;

        tracing::debug!("Updated {} record {}", T::schema().table, id);
        Ok(())
    }

    /// Permanently remove a record
    pub fn delete(&mut self, id: i64) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::schema().table);

        let tx = self.conn.transaction()?;
        let affected = tx.execute(&sql, [id])?;
        if affected == 0 {
            return Err(Error::NotFound(id));
        }
        tx.commit()?;

        tracing::debug!("Deleted {} record {}", T::schema().table, id);
        Ok(())
    }

    /// Count all records
    pub fn count(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = count_rows(&tx, T::schema().table)?;
        tx.commit()?;
        Ok(rows)
    }

    /// Get table statistics
    pub fn status(&self) -> Result<StoreStatus> {
        let schema = T::schema();

        let tx = self.conn.unchecked_transaction()?;
        let columns = migrate::live_columns(&tx, schema.table)?;
        let rows = count_rows(&tx, schema.table)?;
        let migrations = migrate::applied_migrations(&tx)?;
        tx.commit()?;

        let missing_columns = schema
            .column_names()
            .filter(|name| !columns.iter().any(|c| c == name))
            .collect();

        Ok(StoreStatus {
            table: schema.table,
            database: self.database.clone(),
            rows,
            columns,
            missing_columns,
            migrations,
        })
    }

    // ========== Seeding ==========

    /// Insert the fixture rows, binding only columns the live table has
    fn seed(&mut self) -> Result<usize> {
        let schema = T::schema();
        let fixtures = T::fixtures();
        if fixtures.is_empty() {
            return Ok(0);
        }

        let live: HashSet<String> = migrate::live_columns(&self.conn, schema.table)?
            .into_iter()
            .collect();
        let created_at = schema::now_timestamp();

        let rows: Vec<Vec<(&'static str, Value)>> = fixtures
            .iter()
            .map(|fixture| {
                let mut values = fixture.values();
                values.push((CREATED_AT, Value::Text(created_at.clone())));
                values.retain(|(column, _)| live.contains(*column));
                values
            })
            .collect();

        let columns: Vec<&'static str> = rows[0].iter().map(|(c, _)| *c).collect();
        if columns.is_empty() {
            tracing::warn!("Skipping seed data for {}: no seedable columns", schema.table);
            return Ok(0);
        }
        let sql = insert_sql(schema.table, columns.iter().copied());

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &rows {
                stmt.execute(params_from_iter(row.iter().map(|(_, v)| v)))?;
            }
        }
        tx.commit()?;

        tracing::info!("Seeded {} example rows into {}", rows.len(), schema.table);
        Ok(rows.len())
    }
}

fn connect(config: &StoreConfig) -> Result<Connection> {
    let conn = if config.is_in_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open(&config.database)
    }
    .map_err(|e| {
        Error::Connection(format!("could not open {}: {}", config.database.display(), e))
    })?;

    conn.busy_timeout(Duration::from_secs(5))
        .map_err(|e| Error::Connection(format!("could not configure connection: {}", e)))?;

    Ok(conn)
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count as usize)
}

fn select_sql(schema: &schema::TableSchema) -> String {
    let fields: Vec<&str> = schema
        .column_names()
        .filter(|name| *name != CREATED_AT)
        .collect();
    format!(
        "SELECT id, {}, {} FROM {}",
        CREATED_AT,
        fields.join(", "),
        schema.table
    )
}

fn insert_sql<'a>(table: &str, columns: impl Iterator<Item = &'a str>) -> String {
    let columns: Vec<&str> = columns.collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Helper to convert a row to a Record
fn row_to_record<T: RecordShape>(row: &rusqlite::Row) -> rusqlite::Result<Record<T>> {
    let created_at: NaiveDateTime = row.get(CREATED_AT)?;
    Ok(Record {
        id: row.get("id")?,
        created_at,
        fields: T::from_row(row)?,
    })
}
