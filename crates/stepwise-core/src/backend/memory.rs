use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use stepwise_common::{Error, Result};

use super::StorageBackend;

#[derive(Debug, Default)]
struct MemoryState {
    cursor: Option<u64>,
    label: String,
    writes: usize,
}

/// Process-local cursor storage.
///
/// Clones share state, so a factory can hand out a fresh handle per
/// operation and every handle observes earlier writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that starts with `cursor` already persisted.
    pub fn with_cursor(cursor: u64) -> Self {
        let backend = Self::new();
        if let Ok(mut state) = backend.state.lock() {
            state.cursor = Some(cursor);
        }
        backend
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Storage("memory backend lock poisoned".into()))
    }

    /// Label passed to the most recent `save_index`.
    pub fn last_label(&self) -> Result<String> {
        Ok(self.lock()?.label.clone())
    }

    /// Number of `save_index` calls so far.
    pub fn write_count(&self) -> Result<usize> {
        Ok(self.lock()?.writes)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> &str {
        "memory"
    }

    async fn save_index(&self, index: u64, label: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.cursor = Some(index);
        state.label = label.to_string();
        state.writes += 1;
        Ok(())
    }

    async fn load_index(&self) -> Result<u64> {
        let mut state = self.lock()?;
        Ok(*state.cursor.get_or_insert(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_backend_loads_zero() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.load_index().await.unwrap(), 0);
        assert_eq!(backend.write_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn save_then_load_round_trip() {
        let backend = MemoryBackend::new();
        backend.save_index(7, "0007-add_column").await.unwrap();

        assert_eq!(backend.load_index().await.unwrap(), 7);
        assert_eq!(backend.last_label().unwrap(), "0007-add_column");
        assert_eq!(backend.write_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn clones_share_cursor() {
        let backend = MemoryBackend::with_cursor(2);
        let other = backend.clone();
        other.save_index(3, "c").await.unwrap();
        assert_eq!(backend.load_index().await.unwrap(), 3);
    }
}
