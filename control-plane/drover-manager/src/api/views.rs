use drover_worker::{ComponentPath, LogResponse, StatusResponse};
use serde::Serialize;
use std::collections::HashMap;

/// Desired paths plus the current version-index contents, keyed "user/repo".
#[derive(Debug, Serialize)]
pub struct ComponentsView {
    pub active: Vec<ComponentPath>,
    pub versions: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct WorkerStatusView {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkerLogsView {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<LogResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
