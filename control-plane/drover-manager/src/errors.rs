use drover_worker::WorkerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("registry backend unavailable: {0}")]
    Unavailable(String),

    #[error("internal registry error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum ActivatorError {
    #[error("no artifact staged for {0}")]
    UnknownComponent(String),

    #[error("failed to stage artifact: {0}")]
    Stage(#[from] std::io::Error),

    #[error("worker call failed: {0}")]
    Worker(#[from] WorkerError),
}

/// Errors that abort a reconciliation pass. The dirty-signal consumer logs
/// them and waits for the next signal; the next pass re-derives intent from
/// fresh worker status.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("failed to read desired components: {0}")]
    DesiredState(#[from] StorageError),

    #[error("worker status failed: {0}")]
    Worker(#[from] WorkerError),

    #[error("activation failed: {0}")]
    Activation(#[from] ActivatorError),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::{http::StatusCode, Json};
        use serde_json::json;

        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
