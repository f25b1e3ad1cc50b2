use crate::{
    api::{create_middleware_stack, handlers},
    config::ServerConfig,
    reconciler::Reconciler,
    registry::ComponentRegistry,
};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use drover_worker::WorkerApi;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub registry: Arc<dyn ComponentRegistry>,
    pub workers: Vec<Arc<dyn WorkerApi>>,
}

pub struct ApiServer {
    app: Router,
    config: ServerConfig,
}

impl ApiServer {
    pub fn new(
        reconciler: Arc<Reconciler>,
        registry: Arc<dyn ComponentRegistry>,
        workers: Vec<Arc<dyn WorkerApi>>,
        config: ServerConfig,
    ) -> Self {
        let state = AppState {
            reconciler,
            registry,
            workers,
        };

        let app = Router::new()
            // Version update intake
            .route("/api/v1/updates", post(handlers::push_update))
            .route("/api/v1/reconcile", post(handlers::trigger_reconcile))
            // Desired-state management
            .route("/api/v1/components", get(handlers::list_components))
            .route(
                "/api/v1/components/{user}/{repo}",
                put(handlers::declare_component),
            )
            .route(
                "/api/v1/components/{user}/{repo}",
                delete(handlers::remove_component),
            )
            // Fleet introspection
            .route("/api/v1/workers", get(handlers::list_worker_status))
            .route("/api/v1/workers/logs", get(handlers::list_worker_logs))
            // Health check endpoint
            .route("/health", get(health_check))
            .layer(create_middleware_stack())
            .with_state(state);

        Self { app, config }
    }

    pub async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Deployment manager API server listening on {}", addr);
        info!("Health check available at: http://{}/health", addr);

        axum::serve(listener, self.app).await?;

        Ok(())
    }

    /// Consume and return the underlying Axum Router so callers can serve it
    /// themselves (e.g., on an ephemeral port in tests).
    pub fn into_router(self) -> Router {
        self.app
    }
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "drover-manager",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
