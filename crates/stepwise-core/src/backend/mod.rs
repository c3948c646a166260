pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use stepwise_common::Result;

pub use memory::MemoryBackend;

/// Durable home of the migration cursor.
///
/// Implementations are created fresh for every engine operation and are
/// only ever called sequentially.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Key the backend is registered under, for diagnostics.
    fn kind(&self) -> &str;

    /// Persist `index` so that any later `load_index`, in this or another
    /// process, observes it. `label` is advisory.
    async fn save_index(&self, index: u64, label: &str) -> Result<()>;

    /// Return the persisted cursor, initializing it to 0 when nothing has
    /// been saved yet.
    async fn load_index(&self) -> Result<u64>;
}

/// Zero-argument constructor for a storage backend.
pub type BackendFactory = Arc<dyn Fn() -> Result<Box<dyn StorageBackend>> + Send + Sync>;

/// Storage backend constructors keyed by name.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the constructor for `key`.
    pub fn register<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn StorageBackend>> + Send + Sync + 'static,
    {
        self.factories.insert(key.into(), Arc::new(factory));
    }

    pub fn get(&self, key: &str) -> Option<&BackendFactory> {
        self.factories.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
