#![allow(dead_code)]

use async_trait::async_trait;
use drover_manager::{
    Activator, ComponentRegistry, EventIntake, MemoryArtifactStore,
    MemoryComponentRegistry, Reconciler,
};
use drover_worker::{
    ComponentID, ComponentPath, ComponentStats, LogResponse, StatusResponse,
    WorkerApi, WorkerError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetAction {
    Activate { worker: String, id: ComponentID },
    Deactivate { worker: String, id: ComponentID },
}

pub type ActionLog = Arc<Mutex<Vec<FleetAction>>>;

pub fn new_log() -> ActionLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn actions(log: &ActionLog) -> Vec<FleetAction> {
    log.lock().unwrap().clone()
}

pub fn activates(log: &ActionLog) -> Vec<FleetAction> {
    actions(log)
        .into_iter()
        .filter(|a| matches!(a, FleetAction::Activate { .. }))
        .collect()
}

pub fn deactivates(log: &ActionLog) -> Vec<FleetAction> {
    actions(log)
        .into_iter()
        .filter(|a| matches!(a, FleetAction::Deactivate { .. }))
        .collect()
}

/// In-process worker with mutable running state, recording every activate
/// and deactivate into a fleet-wide ordered log.
pub struct FakeWorker {
    url: String,
    running: Mutex<Vec<ComponentID>>,
    log: ActionLog,
    fail_status: AtomicBool,
    status_calls: AtomicUsize,
}

impl FakeWorker {
    pub fn new(url: impl Into<String>, log: ActionLog) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            running: Mutex::new(Vec::new()),
            log,
            fail_status: AtomicBool::new(false),
            status_calls: AtomicUsize::new(0),
        })
    }

    /// Seed initial running state.
    pub fn run(&self, id: ComponentID) {
        self.running.lock().unwrap().push(id);
    }

    pub fn running(&self) -> Vec<ComponentID> {
        self.running.lock().unwrap().clone()
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

fn stats_for(id: ComponentID) -> ComponentStats {
    ComponentStats {
        id,
        color: String::new(),
        stat_window_seconds: 0.0,
        hits: 0.0,
        avg_response_bytes: 0.0,
        avg_ms_latency: 0.0,
        ms_latency_percentiles: Vec::new(),
    }
}

#[async_trait]
impl WorkerApi for FakeWorker {
    fn url(&self) -> &str {
        &self.url
    }

    async fn status(&self) -> Result<StatusResponse, WorkerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(WorkerError::Status(
                reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }

        let running = self.running.lock().unwrap();
        Ok(StatusResponse {
            active_components: running.iter().cloned().map(stats_for).collect(),
            ..Default::default()
        })
    }

    async fn activate(
        &self,
        id: &ComponentID,
        _archive_path: &str,
    ) -> Result<(), WorkerError> {
        self.running.lock().unwrap().push(id.clone());
        self.log.lock().unwrap().push(FleetAction::Activate {
            worker: self.url.clone(),
            id: id.clone(),
        });
        Ok(())
    }

    async fn deactivate(&self, id: &ComponentID) -> Result<(), WorkerError> {
        self.running.lock().unwrap().retain(|r| r != id);
        self.log.lock().unwrap().push(FleetAction::Deactivate {
            worker: self.url.clone(),
            id: id.clone(),
        });
        Ok(())
    }

    async fn logs(&self) -> Result<LogResponse, WorkerError> {
        Ok(LogResponse::default())
    }
}

pub struct TestBed {
    pub reconciler: Arc<Reconciler>,
    pub intake: Option<EventIntake>,
    pub registry: Arc<dyn ComponentRegistry>,
    pub store: MemoryArtifactStore,
    pub workers: Vec<Arc<FakeWorker>>,
    pub log: ActionLog,
}

impl TestBed {
    /// Push an update and fold it into the index synchronously, consuming
    /// the dirty signal it raises.
    pub async fn seed_version(&mut self, id: ComponentID) {
        self.reconciler.update_component_hash(id).await;
        let intake = self.intake.as_mut().expect("intake already consumed");
        intake.apply_queued_updates(&self.reconciler).await;
        intake.take_dirty();
    }

    /// Hand the intake to the background tasks.
    pub fn start(&mut self) {
        let intake = self.intake.take().expect("intake already consumed");
        self.reconciler.start(intake);
    }
}

pub async fn testbed(
    worker_count: usize,
    active: &[ComponentPath],
    seed: u64,
) -> TestBed {
    let log = new_log();
    let workers: Vec<Arc<FakeWorker>> = (0..worker_count)
        .map(|i| FakeWorker::new(format!("w{}:9000", i + 1), log.clone()))
        .collect();

    let registry: Arc<dyn ComponentRegistry> =
        Arc::new(MemoryComponentRegistry::new());
    for path in active {
        registry.declare(path.clone()).await.unwrap();
    }

    let store = MemoryArtifactStore::new();
    let activator = Arc::new(Activator::new(Arc::new(store.clone())));

    let fleet: Vec<Arc<dyn WorkerApi>> = workers
        .iter()
        .map(|w| w.clone() as Arc<dyn WorkerApi>)
        .collect();

    let (reconciler, intake) = Reconciler::new(
        registry.clone(),
        activator,
        fleet,
        StdRng::seed_from_u64(seed),
    );

    TestBed {
        reconciler,
        intake: Some(intake),
        registry,
        store,
        workers,
        log,
    }
}
