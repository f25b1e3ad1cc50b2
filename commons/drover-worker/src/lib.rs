pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpWorker, WorkerApi, EXECUTION_METHOD_DOCKER_ARCHIVE};
pub use error::WorkerError;
pub use types::{
    ComponentID, ComponentLog, ComponentPath, ComponentStats, LogResponse,
    StatusResponse, HEAD_SENTINEL,
};
