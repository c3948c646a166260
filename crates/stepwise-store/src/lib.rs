pub mod file;
pub mod sqlite;

pub use file::FileBackend;
pub use sqlite::{CursorRecord, SqliteBackend};

use stepwise_config::MigrateConfig;
use stepwise_core::{MigrationEngine, StorageBackend};

/// Register the `file` and `sqlite` backends, with paths taken from `config`.
pub fn register_builtin_backends(engine: &mut MigrationEngine, config: &MigrateConfig) {
    let file_path = config.file.path.clone();
    engine.register_backend("file", move || {
        Ok(Box::new(FileBackend::new(file_path.clone())) as Box<dyn StorageBackend>)
    });

    let sqlite_path = config.sqlite.path.clone();
    engine.register_backend("sqlite", move || {
        Ok(Box::new(SqliteBackend::open(&sqlite_path)?) as Box<dyn StorageBackend>)
    });
}
