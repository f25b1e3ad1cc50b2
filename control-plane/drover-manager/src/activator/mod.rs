mod store;

pub use store::{ArtifactStore, DirArtifactStore, MemoryArtifactStore, StagedArtifact};

use crate::errors::ActivatorError;
use drover_worker::{ComponentID, WorkerApi};
use std::sync::Arc;
use tracing::{info, warn};

/// Stages executable artifacts and drives worker activate/deactivate calls.
///
/// Resolving the HEAD sentinel to a concrete hash happens here, never in the
/// reconciler; the reconciler only consumes the resolved hash.
pub struct Activator {
    store: Arc<dyn ArtifactStore>,
}

impl Activator {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Stage the artifact for `id` and activate it on `worker`. Returns the
    /// concrete hash actually deployed.
    pub async fn activate(
        &self,
        id: &ComponentID,
        worker: &dyn WorkerApi,
    ) -> Result<String, ActivatorError> {
        let staged = self.store.stage(id).await?;
        let resolved = ComponentID::for_path(&id.path(), staged.hash.clone());
        info!(component = %resolved, worker = worker.url(), "activating component");
        worker.activate(&resolved, &staged.archive_path).await?;
        Ok(staged.hash)
    }

    pub async fn deactivate(
        &self,
        id: &ComponentID,
        worker: &dyn WorkerApi,
    ) -> Result<(), ActivatorError> {
        info!(component = %id, worker = worker.url(), "deactivating component");
        worker.deactivate(id).await?;
        Ok(())
    }

    /// Best-effort sweep: deactivate `id` on every worker, logging and
    /// continuing past per-worker failures.
    pub async fn deactivate_everywhere(
        &self,
        id: &ComponentID,
        workers: &[Arc<dyn WorkerApi>],
    ) {
        for worker in workers {
            if let Err(e) = self.deactivate(id, worker.as_ref()).await {
                warn!(
                    component = %id,
                    worker = worker.url(),
                    error = %e,
                    "failed to deactivate on worker"
                );
            }
        }
    }
}
