use std::env;
use std::path::PathBuf;

/// Which persistence backend the process runs against. Chosen once at
/// startup; never switched mid-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
}

impl CatalogConfig {
    /// Reads process configuration from the environment.
    ///
    /// `CATALOG_STORAGE_BACKEND` selects the backend (`file` is the default;
    /// `sqlite`, `relational`, or `db` select SQLite), `CATALOG_DATA_DIR`
    /// points at the JSON collections, and `CATALOG_DB_PATH` overrides the
    /// SQLite file location.
    pub fn from_env() -> Self {
        let backend = match env::var("CATALOG_STORAGE_BACKEND").as_deref() {
            Ok("sqlite") | Ok("relational") | Ok("db") => StorageBackend::Sqlite,
            _ => StorageBackend::File,
        };
        let data_dir = PathBuf::from(
            env::var("CATALOG_DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        );
        let database_path = env::var("CATALOG_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("catalog.db"));
        Self {
            backend,
            data_dir,
            database_path,
        }
    }

    /// File-backed configuration rooted at `data_dir`.
    pub fn file_store(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let database_path = data_dir.join("catalog.db");
        Self {
            backend: StorageBackend::File,
            data_dir,
            database_path,
        }
    }
}
