//! Formstore CLI - command-line front end for the complaint and library stores

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use formstore::config::{self, FormstoreConfig};
use formstore::output::OutputMode;
use formstore::ui;
use formstore::{BookColumn, ComplaintColumn, ComplaintStatus, ComplaintType, Gender, Priority};

mod commands;

#[derive(Parser)]
#[command(name = "formstore")]
#[command(version)]
#[command(about = "Self-provisioning record store for complaint and library-catalog forms")]
#[command(long_about = r#"
Formstore keeps each form's records in a SQLite table that it creates,
reconciles and seeds on startup, then lets you add, list, search, edit
and delete records.

Example usage:
  formstore init
  formstore complaints add --name "Aman Sharma" --type "Hostel Issue" --text "Bathroom not cleaned"
  formstore complaints list --search Aman
  formstore books list --field isbn --search 978
  formstore status
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "formstore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Deployment {
    Complaints,
    Books,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Show columns, migrations and row counts
    Status {
        /// Limit to one store
        #[arg(value_enum)]
        deployment: Option<Deployment>,
    },

    /// Manage student complaints
    Complaints {
        #[command(subcommand)]
        action: ComplaintAction,
    },

    /// Manage the library catalog
    Books {
        #[command(subcommand)]
        action: BookAction,
    },
}

#[derive(Subcommand)]
pub enum ComplaintAction {
    /// Submit a new complaint
    Add {
        /// Full name of the student
        #[arg(long)]
        name: String,

        /// Male, Female or Other
        #[arg(long, default_value = "Male")]
        gender: Gender,

        /// Complaint type (e.g. "Hostel Issue", "Transport")
        #[arg(long = "type", default_value = "Academic Issue")]
        complaint_type: ComplaintType,

        /// Low, Medium, High or Urgent
        #[arg(long, default_value = "Medium")]
        priority: Priority,

        /// Complaint text
        #[arg(long)]
        text: String,
    },

    /// List complaints, most recent first
    List {
        /// Substring to look for (case-sensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Column searched by --search
        #[arg(short, long, default_value = "name")]
        field: ComplaintColumn,

        /// Show a single complaint
        #[arg(long, conflicts_with = "search")]
        id: Option<i64>,
    },

    /// Edit an existing complaint
    Edit {
        #[arg(long)]
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        gender: Option<Gender>,

        #[arg(long = "type")]
        complaint_type: Option<ComplaintType>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        status: Option<ComplaintStatus>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Delete a complaint
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BookAction {
    /// Add a book to the catalog
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        author: String,

        #[arg(long)]
        publisher: Option<String>,

        #[arg(long)]
        year: Option<i32>,

        #[arg(long)]
        isbn: Option<String>,

        /// Copies on hand
        #[arg(long, default_value = "1")]
        quantity: u32,
    },

    /// List books, most recent first
    List {
        /// Substring to look for (case-sensitive)
        #[arg(short, long)]
        search: Option<String>,

        /// Column searched by --search
        #[arg(short, long, default_value = "title")]
        field: BookColumn,

        /// Show a single book
        #[arg(long, conflicts_with = "search")]
        id: Option<i64>,
    },

    /// Edit an existing book
    Edit(BookEdit),

    /// Delete a book
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[derive(Args)]
pub struct BookEdit {
    #[arg(long)]
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub author: Option<String>,

    /// Pass an empty string to clear
    #[arg(long)]
    pub publisher: Option<String>,

    #[arg(long)]
    pub year: Option<i32>,

    /// Remove the publication year
    #[arg(long, conflicts_with = "year")]
    pub clear_year: bool,

    /// Pass an empty string to clear
    #[arg(long)]
    pub isbn: Option<String>,

    #[arg(long)]
    pub quantity: Option<u32>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = OutputMode::from_flag(cli.json);

    if let Err(e) = run(cli.command, &cli.config, mode) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(command: Commands, config_path: &Path, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        Commands::Init { force } => commands::run_init(config_path, force, mode),
        Commands::Status { deployment } => {
            commands::run_status(&load_settings(config_path)?, deployment, mode)
        }
        Commands::Complaints { action } => {
            let settings = load_settings(config_path)?;
            commands::run_complaints(&settings.complaints_store(), action, mode)
        }
        Commands::Books { action } => {
            let settings = load_settings(config_path)?;
            commands::run_books(&settings.books_store(), action, mode)
        }
    }
}

/// Config file contents, or defaults when the file does not exist
fn load_settings(path: &Path) -> anyhow::Result<FormstoreConfig> {
    Ok(config::load_config(Some(path))?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_edit(args: &[&str]) -> BookEdit {
        let argv: Vec<&str> = ["formstore", "books", "edit"].iter().chain(args).copied().collect();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Books { action: BookAction::Edit(edit) } => edit,
            _ => panic!("expected books edit"),
        }
    }

    #[test]
    fn test_book_edit_clear_year() {
        let edit = book_edit(&["--id", "3", "--clear-year"]);
        assert_eq!(edit.id, 3);
        assert!(edit.clear_year);
        assert_eq!(edit.year, None);

        let argv = ["formstore", "books", "edit", "--id", "3", "--year", "1936", "--clear-year"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
