pub mod activator;
pub mod api;
pub mod config;
pub mod errors;
pub mod reconciler;
pub mod registry;
pub mod server;

pub use activator::{
    Activator, ArtifactStore, DirArtifactStore, MemoryArtifactStore,
    StagedArtifact,
};
pub use config::{AppConfig, ServerConfig};
pub use errors::{ActivatorError, ApiError, ReconcileError, StorageError};
pub use reconciler::{EventIntake, Reconciler, VersionIndex};
pub use registry::{ComponentRegistry, MemoryComponentRegistry};
pub use server::{ApiServer, AppState};
