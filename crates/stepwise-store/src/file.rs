use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stepwise_common::{Error, Result};
use stepwise_core::StorageBackend;
use tracing::{debug, info};

/// Stores the cursor as a plain integer in a text file.
///
/// The label is not persisted.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_cursor(&self, index: u64) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Storage(format!(
                    "failed to create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        // Write then rename so a crash never leaves a half-written cursor.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, index.to_string())
            .await
            .map_err(|e| Error::Storage(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            Error::Storage(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    fn kind(&self) -> &str {
        "file"
    }

    async fn save_index(&self, index: u64, label: &str) -> Result<()> {
        debug!(
            "saving cursor @{index} ({label}) to {}",
            self.path.display()
        );
        self.write_cursor(index).await
    }

    async fn load_index(&self) -> Result<u64> {
        let exists = tokio::fs::try_exists(&self.path).await.map_err(|e| {
            Error::Storage(format!("failed to stat {}: {e}", self.path.display()))
        })?;
        if !exists {
            info!("initializing cursor file at {}", self.path.display());
            self.write_cursor(0).await?;
            return Ok(0);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Storage(format!("failed to read {}: {e}", self.path.display())))?;
        contents.trim().parse::<u64>().map_err(|e| {
            Error::Storage(format!(
                "invalid cursor in {}: {:?} ({e})",
                self.path.display(),
                contents.trim()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_load_initializes_file_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration");
        let backend = FileBackend::new(&path);

        assert_eq!(backend.load_index().await.unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0");
    }

    #[tokio::test]
    async fn save_then_load_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("migration");

        FileBackend::new(&path)
            .save_index(12, "20240101-000000-seed.yml")
            .await
            .unwrap();

        let reopened = FileBackend::new(&path);
        assert_eq!(reopened.load_index().await.unwrap(), 12);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "12");
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn tolerates_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration");
        std::fs::write(&path, "3\n").unwrap();

        assert_eq!(FileBackend::new(&path).load_index().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn garbage_contents_are_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migration");
        std::fs::write(&path, "three").unwrap();

        let err = FileBackend::new(&path).load_index().await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("invalid cursor"));
    }
}
