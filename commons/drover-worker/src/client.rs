use crate::error::WorkerError;
use crate::types::{ComponentID, LogResponse, StatusResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

/// The only execution method workers currently accept.
pub const EXECUTION_METHOD_DOCKER_ARCHIVE: &str = "docker-archive";

/// Typed facade over one worker's `/meta/*` HTTP API.
///
/// The reconciler and activator talk to workers exclusively through this
/// trait so tests can substitute an in-process fleet.
#[async_trait]
pub trait WorkerApi: Send + Sync {
    fn url(&self) -> &str;

    async fn status(&self) -> Result<StatusResponse, WorkerError>;

    async fn activate(
        &self,
        id: &ComponentID,
        archive_path: &str,
    ) -> Result<(), WorkerError>;

    async fn deactivate(&self, id: &ComponentID) -> Result<(), WorkerError>;

    async fn logs(&self) -> Result<LogResponse, WorkerError>;
}

#[derive(Serialize)]
struct ActivateRequest<'a> {
    id: &'a ComponentID,
    executable_file: &'a str,
    execution_method: &'a str,
}

#[derive(Serialize)]
struct DeactivateRequest<'a> {
    id: &'a ComponentID,
}

/// Worker client backed by reqwest. Addresses the worker as `http://{url}`.
pub struct HttpWorker {
    url: String,
    client: Client,
}

impl HttpWorker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
        }
    }

    /// Build against a shared client, e.g. one carrying a request timeout.
    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    fn route(&self, route: &str) -> String {
        format!("http://{}{}", self.url, route)
    }

    async fn get_json<T>(&self, route: &str) -> Result<T, WorkerError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        let response = self.client.get(self.route(route)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status));
        }
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// POST a JSON body. The worker's response body is logged but never
    /// parsed; a 2xx with an error payload still counts as success.
    async fn post_logged<B: Serialize>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<(), WorkerError> {
        let response = self
            .client
            .post(self.route(route))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status));
        }
        let text = response.text().await?;
        info!(worker = %self.url, response = %text, "response from worker");
        Ok(())
    }
}

#[async_trait]
impl WorkerApi for HttpWorker {
    fn url(&self) -> &str {
        &self.url
    }

    async fn status(&self) -> Result<StatusResponse, WorkerError> {
        self.get_json("/meta/status").await
    }

    async fn activate(
        &self,
        id: &ComponentID,
        archive_path: &str,
    ) -> Result<(), WorkerError> {
        let body = ActivateRequest {
            id,
            executable_file: archive_path,
            execution_method: EXECUTION_METHOD_DOCKER_ARCHIVE,
        };
        self.post_logged("/meta/activate", &body).await
    }

    async fn deactivate(&self, id: &ComponentID) -> Result<(), WorkerError> {
        let body = DeactivateRequest { id };
        self.post_logged("/meta/deactivate", &body).await
    }

    async fn logs(&self) -> Result<LogResponse, WorkerError> {
        self.get_json("/meta/logs").await
    }
}
