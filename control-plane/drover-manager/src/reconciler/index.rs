use drover_worker::{ComponentID, ComponentPath};
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

/// Authoritative mapping from component path to the hash the control plane
/// most recently announced as current.
///
/// The single mutex serializes update application against reconciliation:
/// a pass holds the guard for its entire duration, so it observes a frozen
/// snapshot and updates arriving mid-pass queue up behind it.
pub struct VersionIndex {
    entries: Mutex<HashMap<ComponentPath, String>>,
}

impl VersionIndex {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Apply one update event. Later writes for the same path win.
    pub async fn record(&self, id: &ComponentID) {
        let mut entries = self.entries.lock().await;
        entries.insert(id.path(), id.hash.clone());
    }

    /// Take the index lock for the duration of a reconciliation pass.
    pub async fn lock(&self) -> MutexGuard<'_, HashMap<ComponentPath, String>> {
        self.entries.lock().await
    }

    /// Clone of the current entries, for introspection endpoints.
    pub async fn snapshot(&self) -> HashMap<ComponentPath, String> {
        self.entries.lock().await.clone()
    }
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self::new()
    }
}
