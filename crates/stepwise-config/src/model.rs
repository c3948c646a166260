use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub migrate: MigrateConfig,
    pub log: LogConfig,
}

/// Settings for the migration engine and its storage backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrateConfig {
    /// Key of the registered storage backend to activate (`file`, `sqlite`, ...).
    pub storage: Option<String>,
    /// Directory holding script migrations and where `new` writes scaffolds.
    pub migrations_dir: PathBuf,
    pub file: FileStorageConfig,
    pub sqlite: SqliteStorageConfig,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            storage: None,
            migrations_dir: PathBuf::from("res/migrate"),
            file: FileStorageConfig::default(),
            sqlite: SqliteStorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub path: PathBuf,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("migration"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteStorageConfig {
    pub path: PathBuf,
}

impl Default for SqliteStorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("migrations.db"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `info` or `stepwise=debug`.
    pub level: Option<String>,
}
