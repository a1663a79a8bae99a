//! Database schema definitions

/// Column holding the store-assigned creation time
pub const CREATED_AT: &str = "created_at";

/// Format used for `created_at` values (UTC, millisecond precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Backfill value for `created_at` on tables that predate the column.
/// SQLite rejects non-constant defaults in `ALTER TABLE ADD COLUMN`.
pub const EPOCH_DEFAULT: &str = "'1970-01-01 00:00:00.000'";

/// Current UTC time in [`TIMESTAMP_FORMAT`]
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// SQL to create the migration ledger
pub const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    name TEXT PRIMARY KEY,
    applied_at TEXT NOT NULL
)
"#;

/// Storage class of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

/// One entry of a schema descriptor: name, type, nullability and default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    /// SQL literal, already quoted where needed
    pub default: Option<&'static str>,
}

impl ColumnSpec {
    pub const fn required(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            default: None,
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    /// Column definition as used after `ADD COLUMN <name>`
    pub fn definition(&self) -> String {
        let mut def = self.sql_type.as_str().to_string();
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }
}

/// The complete expected shape of a managed table.
///
/// `create_sql` provisions the base table with its minimal columns;
/// `columns` is the full descriptor that reconciliation brings the live
/// table up to. The identity column is part of the base table only.
#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    pub create_sql: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Ledger key for the base-table step
    pub fn create_migration(&self) -> String {
        format!("{}:create", self.table)
    }

    /// Ledger key for adding one column
    pub fn add_column_migration(&self, column: &str) -> String {
        format!("{}:add_column:{}", self.table, column)
    }
}
