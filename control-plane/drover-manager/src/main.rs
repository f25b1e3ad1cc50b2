use anyhow::Result;
use clap::Command;
use drover_manager::{
    Activator, ApiServer, AppConfig, ComponentRegistry, DirArtifactStore,
    MemoryComponentRegistry, Reconciler,
};
use drover_worker::{HttpWorker, WorkerApi};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let _matches = Command::new("drover-manager")
        .about("Drover deployment manager")
        .version("0.1.0")
        .get_matches();

    info!("Loading configuration from environment variables...");
    let config = AppConfig::load_from_env()?;

    let client = reqwest::Client::builder()
        .user_agent("drover-manager/0.1.0")
        .timeout(Duration::from_secs(config.worker_timeout_seconds))
        .build()?;

    let workers: Vec<Arc<dyn WorkerApi>> = config
        .worker_urls()
        .into_iter()
        .map(|url| {
            Arc::new(HttpWorker::with_client(url, client.clone()))
                as Arc<dyn WorkerApi>
        })
        .collect();
    info!(workers = workers.len(), "Configured worker fleet");

    let registry: Arc<dyn ComponentRegistry> =
        Arc::new(MemoryComponentRegistry::new());
    let store = Arc::new(DirArtifactStore::new(config.artifact_dir.clone()));
    let activator = Arc::new(Activator::new(store));

    let reconciler = Reconciler::spawn(
        registry.clone(),
        activator,
        workers.clone(),
        StdRng::from_entropy(),
    );

    // Converge once at startup rather than waiting for the first event
    reconciler.notify_component_state_changed();

    let server =
        ApiServer::new(reconciler, registry, workers, config.server());

    info!("Starting deployment manager API server...");
    if let Err(e) = server.serve().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
