use crate::{
    api::views::{ComponentsView, WorkerLogsView, WorkerStatusView},
    errors::ApiError,
    server::AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use drover_worker::{ComponentID, ComponentPath};
use tracing::{info, warn};

/// Enqueue a version update for a component. External callers (build
/// pipelines, webhooks) announce new hashes here.
pub async fn push_update(
    State(state): State<AppState>,
    Json(id): Json<ComponentID>,
) -> Result<StatusCode, ApiError> {
    if id.user.is_empty() || id.repo.is_empty() || id.hash.is_empty() {
        return Err(ApiError::BadRequest(
            "user, repo and hash must be non-empty".to_string(),
        ));
    }

    info!(component = %id, "API: queueing version update");
    state.reconciler.update_component_hash(id).await;
    Ok(StatusCode::ACCEPTED)
}

/// Force a reconciliation pass. Idempotent while one is already pending.
pub async fn trigger_reconcile(State(state): State<AppState>) -> StatusCode {
    info!("API: raising dirty signal");
    state.reconciler.notify_component_state_changed();
    StatusCode::ACCEPTED
}

pub async fn list_components(
    State(state): State<AppState>,
) -> Result<Json<ComponentsView>, ApiError> {
    let active = state
        .registry
        .find_active_components()
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let versions = state
        .reconciler
        .versions()
        .await
        .into_iter()
        .map(|(path, hash)| (path.to_string(), hash))
        .collect();

    Ok(Json(ComponentsView { active, versions }))
}

pub async fn declare_component(
    State(state): State<AppState>,
    Path((user, repo)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let path = ComponentPath::new(user, repo);
    info!(component = %path, "API: declaring component active");

    state
        .registry
        .declare(path)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    state.reconciler.notify_component_state_changed();
    Ok(StatusCode::CREATED)
}

pub async fn remove_component(
    State(state): State<AppState>,
    Path((user, repo)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let path = ComponentPath::new(user, repo);
    info!(component = %path, "API: removing component");

    let removed = state
        .registry
        .remove(&path)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    if !removed {
        return Err(ApiError::NotFound(format!("component not found: {path}")));
    }

    state.reconciler.notify_component_state_changed();
    Ok(StatusCode::NO_CONTENT)
}

/// Per-worker status snapshots. A failing worker is reported inline rather
/// than failing the whole view.
pub async fn list_worker_status(
    State(state): State<AppState>,
) -> Json<Vec<WorkerStatusView>> {
    let mut views = Vec::with_capacity(state.workers.len());

    for worker in &state.workers {
        let view = match worker.status().await {
            Ok(status) => WorkerStatusView {
                url: worker.url().to_string(),
                status: Some(status),
                error: None,
            },
            Err(e) => {
                warn!(worker = worker.url(), error = %e, "failed to fetch worker status");
                WorkerStatusView {
                    url: worker.url().to_string(),
                    status: None,
                    error: Some(e.to_string()),
                }
            }
        };
        views.push(view);
    }

    Json(views)
}

pub async fn list_worker_logs(
    State(state): State<AppState>,
) -> Json<Vec<WorkerLogsView>> {
    let mut views = Vec::with_capacity(state.workers.len());

    for worker in &state.workers {
        let view = match worker.logs().await {
            Ok(logs) => WorkerLogsView {
                url: worker.url().to_string(),
                logs: Some(logs),
                error: None,
            },
            Err(e) => {
                warn!(worker = worker.url(), error = %e, "failed to fetch worker logs");
                WorkerLogsView {
                    url: worker.url().to_string(),
                    logs: None,
                    error: Some(e.to_string()),
                }
            }
        };
        views.push(view);
    }

    Json(views)
}
