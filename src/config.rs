use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Connection settings for one store, passed explicitly to
/// [`crate::RecordStore::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file, or `:memory:`
    pub database: PathBuf,
    /// Insert fixture rows when the table is found empty
    pub seed: bool,
}

pub const IN_MEMORY: &str = ":memory:";

impl StoreConfig {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            seed: true,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn without_seed(mut self) -> Self {
        self.seed = false;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.database.as_os_str() == IN_MEMORY
    }
}

/// One `[section]` of `formstore.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub database: Option<String>,
    pub seed: Option<bool>,
}

impl DeploymentConfig {
    fn resolve(&self, default_database: PathBuf) -> StoreConfig {
        StoreConfig {
            database: self.database.as_ref().map(PathBuf::from).unwrap_or(default_database),
            seed: self.seed.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FormstoreConfig {
    pub complaints: Option<DeploymentConfig>,
    pub books: Option<DeploymentConfig>,
}

impl FormstoreConfig {
    /// Config with every section spelled out, as written by `formstore init`
    pub fn with_defaults() -> Self {
        let section = |path: PathBuf| DeploymentConfig {
            database: Some(path.to_string_lossy().into_owned()),
            seed: Some(true),
        };
        Self {
            complaints: Some(section(default_complaints_database())),
            books: Some(section(default_books_database())),
        }
    }

    pub fn complaints_store(&self) -> StoreConfig {
        self.complaints
            .clone()
            .unwrap_or_default()
            .resolve(default_complaints_database())
    }

    pub fn books_store(&self) -> StoreConfig {
        self.books
            .clone()
            .unwrap_or_default()
            .resolve(default_books_database())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("formstore.toml")
}

pub fn default_complaints_database() -> PathBuf {
    PathBuf::from(".formstore").join("complaints.db")
}

pub fn default_books_database() -> PathBuf {
    PathBuf::from(".formstore").join("library.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FormstoreConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FormstoreConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FormstoreConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Create the directory that holds the database file.
///
/// Returns whether a directory had to be created.
pub fn ensure_container(db_path: &Path) -> std::io::Result<bool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("formstore.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formstore.toml");
        let config = FormstoreConfig {
            complaints: Some(DeploymentConfig {
                database: Some("data/cu.db".to_string()),
                seed: Some(false),
            }),
            books: None,
        };

        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded, config);

        let complaints = loaded.complaints_store();
        assert_eq!(complaints.database, PathBuf::from("data/cu.db"));
        assert!(!complaints.seed);

        let books = loaded.books_store();
        assert_eq!(books.database, default_books_database());
        assert!(books.seed);
    }

    #[test]
    fn test_ensure_container() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("store").join("app.db");
        assert!(ensure_container(&db).unwrap());
        assert!(db.parent().unwrap().is_dir());
        assert!(!ensure_container(&db).unwrap());
        assert!(!ensure_container(Path::new(IN_MEMORY)).unwrap());
    }
}
