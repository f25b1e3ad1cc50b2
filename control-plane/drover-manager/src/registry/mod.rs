use crate::errors::StorageError;
use async_trait::async_trait;
use drover_worker::ComponentPath;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

pub type StorageResult<T> = Result<T, StorageError>;

/// Source of the declared-active component set.
///
/// The reconciler only calls `find_active_components`; the mutating
/// operations exist for the API handlers and whichever backend is wired in.
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// The set of desired paths. Never contains duplicates.
    async fn find_active_components(&self) -> StorageResult<Vec<ComponentPath>>;

    async fn declare(&self, path: ComponentPath) -> StorageResult<()>;

    /// Returns whether the path was present.
    async fn remove(&self, path: &ComponentPath) -> StorageResult<bool>;
}

#[derive(Clone)]
pub struct MemoryComponentRegistry {
    store: Arc<RwLock<HashSet<ComponentPath>>>,
}

impl MemoryComponentRegistry {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashSet::new())),
        }
    }
}

impl Default for MemoryComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComponentRegistry for MemoryComponentRegistry {
    async fn find_active_components(&self) -> StorageResult<Vec<ComponentPath>> {
        let store = self.store.read().await;
        Ok(store.iter().cloned().collect())
    }

    async fn declare(&self, path: ComponentPath) -> StorageResult<()> {
        let mut store = self.store.write().await;
        store.insert(path);
        Ok(())
    }

    async fn remove(&self, path: &ComponentPath) -> StorageResult<bool> {
        let mut store = self.store.write().await;
        Ok(store.remove(path))
    }
}
