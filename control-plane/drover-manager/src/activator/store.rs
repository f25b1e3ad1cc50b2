use crate::errors::ActivatorError;
use async_trait::async_trait;
use drover_worker::{ComponentID, ComponentPath};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A staged, deployable artifact: the concrete hash and the docker-archive
/// path handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub hash: String,
    pub archive_path: String,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stage the artifact for `id`, resolving the HEAD sentinel to a
    /// concrete hash.
    async fn stage(&self, id: &ComponentID) -> Result<StagedArtifact, ActivatorError>;
}

/// Filesystem-backed store.
///
/// Layout: `{root}/{user}/{repo}/{hash}.tar`, with `{root}/{user}/{repo}/HEAD`
/// holding the current hash on a single line.
pub struct DirArtifactStore {
    root: PathBuf,
}

impl DirArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn component_dir(&self, id: &ComponentID) -> PathBuf {
        self.root.join(&id.user).join(&id.repo)
    }
}

#[async_trait]
impl ArtifactStore for DirArtifactStore {
    async fn stage(&self, id: &ComponentID) -> Result<StagedArtifact, ActivatorError> {
        let dir = self.component_dir(id);

        let hash = if id.is_head() {
            let head_ref = dir.join("HEAD");
            let contents = match tokio::fs::read_to_string(&head_ref).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ActivatorError::UnknownComponent(id.to_string()))
                }
                Err(e) => return Err(ActivatorError::Stage(e)),
            };
            let hash = contents.trim().to_string();
            if hash.is_empty() {
                return Err(ActivatorError::UnknownComponent(id.to_string()));
            }
            hash
        } else {
            id.hash.clone()
        };

        let archive = dir.join(format!("{hash}.tar"));
        match tokio::fs::metadata(&archive).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ActivatorError::UnknownComponent(id.to_string()))
            }
            Err(e) => return Err(ActivatorError::Stage(e)),
        }

        Ok(StagedArtifact {
            hash,
            archive_path: archive.to_string_lossy().into_owned(),
        })
    }
}

/// In-memory store for tests and local development. Every hash is assumed
/// staged; HEAD resolves through the recorded head per path.
#[derive(Clone, Default)]
pub struct MemoryArtifactStore {
    heads: Arc<RwLock<HashMap<ComponentPath, String>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_head(&self, path: ComponentPath, hash: impl Into<String>) {
        let mut heads = self.heads.write().await;
        heads.insert(path, hash.into());
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn stage(&self, id: &ComponentID) -> Result<StagedArtifact, ActivatorError> {
        let hash = if id.is_head() {
            let heads = self.heads.read().await;
            heads
                .get(&id.path())
                .cloned()
                .ok_or_else(|| ActivatorError::UnknownComponent(id.to_string()))?
        } else {
            id.hash.clone()
        };

        Ok(StagedArtifact {
            archive_path: format!("memory://{}/{}/{}.tar", id.user, id.repo, hash),
            hash,
        })
    }
}
