use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash value meaning "whatever the activator resolves as current".
pub const HEAD_SENTINEL: &str = "HEAD";

/// Identifies a component independent of version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ComponentPath {
    pub user: String,
    pub repo: String,
}

impl ComponentPath {
    pub fn new(user: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.repo)
    }
}

/// Identifies a specific version of a component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ComponentID {
    pub user: String,
    pub repo: String,
    pub hash: String,
}

impl ComponentID {
    pub fn new(
        user: impl Into<String>,
        repo: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            repo: repo.into(),
            hash: hash.into(),
        }
    }

    pub fn for_path(path: &ComponentPath, hash: impl Into<String>) -> Self {
        Self {
            user: path.user.clone(),
            repo: path.repo.clone(),
            hash: hash.into(),
        }
    }

    pub fn path(&self) -> ComponentPath {
        ComponentPath {
            user: self.user.clone(),
            repo: self.repo.clone(),
        }
    }

    pub fn is_head(&self) -> bool {
        self.hash == HEAD_SENTINEL
    }
}

impl fmt::Display for ComponentID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.user, self.repo, self.hash)
    }
}

/// Per-instance telemetry reported by a worker. Opaque to the reconciler;
/// only `id` is inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentStats {
    pub id: ComponentID,

    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub stat_window_seconds: f64,

    #[serde(default)]
    pub hits: f64,

    #[serde(default)]
    pub avg_response_bytes: f64,
    #[serde(default)]
    pub avg_ms_latency: f64,
    #[serde(default)]
    pub ms_latency_percentiles: Vec<f64>,
}

/// One worker's snapshot from `GET /meta/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    #[serde(default)]
    pub cpu_usage: f64,
    #[serde(default)]
    pub memory_usage: f64,
    #[serde(default)]
    pub network_usage: f64,
    #[serde(default)]
    pub active_components: Vec<ComponentStats>,
}

impl StatusResponse {
    /// Whether any active component matches `path` on (user, repo).
    pub fn contains_path(&self, path: &ComponentPath) -> bool {
        self.active_components
            .iter()
            .any(|c| c.id.user == path.user && c.id.repo == path.repo)
    }

    /// Whether any active component equals `id` on all three fields.
    pub fn contains_exactly(&self, id: &ComponentID) -> bool {
        self.active_components.iter().any(|c| c.id == *id)
    }

    /// Active components whose (user, repo) is not in the desired set.
    pub fn find_nonactive(&self, desired: &[ComponentPath]) -> Vec<ComponentID> {
        self.active_components
            .iter()
            .filter(|c| {
                !desired
                    .iter()
                    .any(|p| p.user == c.id.user && p.repo == c.id.repo)
            })
            .map(|c| c.id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentLog {
    pub id: ComponentID,
    pub dedup_number: u64,
    pub log: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogResponse {
    #[serde(default)]
    pub logs: Vec<ComponentLog>,
}
