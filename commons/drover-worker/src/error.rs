use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("request to worker failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("worker returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to decode worker response: {0}")]
    Decode(#[from] serde_json::Error),
}
