mod index;

pub use index::VersionIndex;

use crate::activator::Activator;
use crate::errors::ReconcileError;
use crate::registry::ComponentRegistry;
use drover_worker::{ComponentID, ComponentPath, WorkerApi, HEAD_SENTINEL};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const UPDATE_QUEUE_CAPACITY: usize = 1024;

/// Receiver halves of the intake queues. Handed back by [`Reconciler::new`]
/// so tests can drive passes directly; [`Reconciler::start`] consumes it.
pub struct EventIntake {
    update_rx: mpsc::Receiver<ComponentID>,
    dirty_rx: mpsc::Receiver<()>,
}

impl EventIntake {
    /// Apply queued version updates to the index without the background
    /// tasks running, raising the dirty signal per applied update. Supports
    /// forced runs driven through [`Reconciler::handle_dirty_state`].
    pub async fn apply_queued_updates(&mut self, mgr: &Reconciler) {
        while let Ok(id) = self.update_rx.try_recv() {
            mgr.index.record(&id).await;
            mgr.notify_component_state_changed();
        }
    }

    /// Consume a pending dirty signal, if any.
    pub fn take_dirty(&mut self) -> bool {
        self.dirty_rx.try_recv().is_ok()
    }
}

/// Drives the worker fleet toward the declared-active component set.
///
/// Version updates flow in through a bounded queue and are folded into the
/// [`VersionIndex`] by a dedicated task; a single-slot dirty signal coalesces
/// bursts into at most one queued reconciliation pass.
pub struct Reconciler {
    registry: Arc<dyn ComponentRegistry>,
    activator: Arc<Activator>,
    workers: Vec<Arc<dyn WorkerApi>>,

    index: VersionIndex,
    update_tx: mpsc::Sender<ComponentID>,
    dirty_tx: mpsc::Sender<()>,

    rng: StdMutex<StdRng>,
}

impl Reconciler {
    /// Build the reconciler and spawn its two consumer tasks.
    pub fn spawn(
        registry: Arc<dyn ComponentRegistry>,
        activator: Arc<Activator>,
        workers: Vec<Arc<dyn WorkerApi>>,
        rng: StdRng,
    ) -> Arc<Self> {
        let (mgr, intake) = Self::new(registry, activator, workers, rng);
        mgr.start(intake);
        mgr
    }

    /// Build without starting the consumer tasks.
    pub fn new(
        registry: Arc<dyn ComponentRegistry>,
        activator: Arc<Activator>,
        workers: Vec<Arc<dyn WorkerApi>>,
        rng: StdRng,
    ) -> (Arc<Self>, EventIntake) {
        let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
        let (dirty_tx, dirty_rx) = mpsc::channel(1);

        let mgr = Arc::new(Self {
            registry,
            activator,
            workers,
            index: VersionIndex::new(),
            update_tx,
            dirty_tx,
            rng: StdMutex::new(rng),
        });

        (mgr, EventIntake { update_rx, dirty_rx })
    }

    /// Spawn the update-applier and dirty-signal consumer tasks.
    pub fn start(self: &Arc<Self>, intake: EventIntake) {
        let EventIntake {
            mut update_rx,
            mut dirty_rx,
        } = intake;

        let mgr = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(id) = update_rx.recv().await {
                mgr.index.record(&id).await;
                mgr.notify_component_state_changed();
            }
        });

        let mgr = Arc::clone(self);
        tokio::spawn(async move {
            while dirty_rx.recv().await.is_some() {
                if let Err(e) = mgr.handle_dirty_state().await {
                    error!(error = %e, "could not reconcile component state");
                }
            }
        });
    }

    /// Enqueue a version update. Blocks only when the queue is full.
    pub async fn update_component_hash(&self, id: ComponentID) {
        if self.update_tx.send(id).await.is_err() {
            error!("version update queue is closed");
        }
    }

    /// Raise the dirty signal. A no-op when one is already pending.
    pub fn notify_component_state_changed(&self) {
        let _ = self.dirty_tx.try_send(());
    }

    /// Current version-index contents, for introspection.
    pub async fn versions(&self) -> HashMap<ComponentPath, String> {
        self.index.snapshot().await
    }

    /// Run one reconciliation pass. The version index stays locked for the
    /// whole pass; the first failed RPC aborts it.
    pub async fn handle_dirty_state(&self) -> Result<(), ReconcileError> {
        let mut versions = self.index.lock().await;

        info!("beginning dirty state handling");

        let active = self.registry.find_active_components().await?;

        info!("deactivating non-active components");
        for worker in &self.workers {
            self.deactivate_nonactive(worker.as_ref(), &active).await?;
        }

        info!("starting active but not running components");
        for path in &active {
            let hash = versions
                .get(path)
                .cloned()
                .unwrap_or_else(|| HEAD_SENTINEL.to_string());
            self.activate_missing(ComponentID::for_path(path, hash), &mut versions)
                .await?;
        }

        info!("ensuring every component runs its current version somewhere");
        for path in &active {
            // Only enforceable when we know what is supposed to be running
            if let Some(correct_hash) = versions.get(path).cloned() {
                self.ensure_version_running(
                    ComponentID::for_path(path, correct_hash),
                    &mut versions,
                )
                .await?;
            }
        }

        info!("deactivating old hashes wherever they are");
        for path in &active {
            let Some(correct_hash) = versions.get(path).cloned() else {
                continue;
            };
            let correct = ComponentID::for_path(path, correct_hash);
            for worker in &self.workers {
                self.deactivate_if_hash_differs(worker.as_ref(), &correct)
                    .await?;
            }
        }

        info!("finished dirty state handling");
        Ok(())
    }

    /// Phase 1: tear down anything running that is not in the desired set.
    async fn deactivate_nonactive(
        &self,
        worker: &dyn WorkerApi,
        active: &[ComponentPath],
    ) -> Result<(), ReconcileError> {
        let status = worker.status().await?;

        for extra in status.find_nonactive(active) {
            info!(component = %extra, worker = worker.url(), "deactivating non-desired component");
            self.activator.deactivate(&extra, worker).await?;
        }

        Ok(())
    }

    /// Phase 2: make sure some version of the path runs somewhere.
    async fn activate_missing(
        &self,
        to_check: ComponentID,
        versions: &mut HashMap<ComponentPath, String>,
    ) -> Result<(), ReconcileError> {
        let path = to_check.path();

        for worker in &self.workers {
            let status = worker.status().await?;
            if status.contains_path(&path) {
                return Ok(());
            }
        }

        let Some(target) = self.pick(&self.workers) else {
            warn!(component = %to_check, "no workers configured, cannot activate");
            return Ok(());
        };

        info!(component = %to_check, worker = target.url(), "activating missing component");
        let resolved = self.activator.activate(&to_check, target.as_ref()).await?;

        // Resolving HEAD pins the concrete hash so later phases see it
        if to_check.is_head() {
            versions.insert(path, resolved);
        }

        Ok(())
    }

    /// Phase 3: make sure the correct version runs somewhere, preferring a
    /// worker not already running any version of the path.
    async fn ensure_version_running(
        &self,
        correct: ComponentID,
        versions: &mut HashMap<ComponentPath, String>,
    ) -> Result<(), ReconcileError> {
        let path = correct.path();

        let mut idle: Vec<usize> = Vec::new();
        let mut running_other: Vec<(usize, ComponentID)> = Vec::new();

        for (i, worker) in self.workers.iter().enumerate() {
            let status = worker.status().await?;
            if status.contains_exactly(&correct) {
                return Ok(());
            }

            match status
                .active_components
                .iter()
                .find(|c| c.id.user == path.user && c.id.repo == path.repo)
            {
                Some(running) => running_other.push((i, running.id.clone())),
                None => idle.push(i),
            }
        }

        let (target_idx, make_room) = if let Some(&i) = self.pick(&idle) {
            (i, None)
        } else if let Some((i, wrong)) = self.pick(&running_other).cloned() {
            // Every worker runs some stale version; evict one to make room
            (i, Some(wrong))
        } else {
            warn!(component = %correct, "no workers configured, cannot ensure version");
            return Ok(());
        };

        let target = self.workers[target_idx].as_ref();
        if let Some(wrong) = make_room {
            self.activator.deactivate(&wrong, target).await?;
        }

        info!(component = %correct, worker = target.url(), "deploying to ensure current version runs");
        let resolved = self.activator.activate(&correct, target).await?;

        if correct.is_head() {
            versions.insert(path, resolved);
        }

        Ok(())
    }

    /// Phase 4: remove every version of the path that is not the correct one.
    async fn deactivate_if_hash_differs(
        &self,
        worker: &dyn WorkerApi,
        correct: &ComponentID,
    ) -> Result<(), ReconcileError> {
        let status = worker.status().await?;

        for running in &status.active_components {
            if running.id.user == correct.user
                && running.id.repo == correct.repo
                && running.id.hash != correct.hash
            {
                info!(component = %running.id, worker = worker.url(), "deactivating stale version");
                self.activator.deactivate(&running.id, worker).await?;
            }
        }

        Ok(())
    }

    fn pick<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().expect("placement rng lock poisoned");
        let i = rng.gen_range(0..items.len());
        Some(&items[i])
    }
}
