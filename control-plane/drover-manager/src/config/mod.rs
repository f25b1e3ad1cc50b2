use anyhow::Result;
use envconfig::Envconfig;

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Server configuration
    #[envconfig(from = "SERVER_HOST", default = "0.0.0.0")]
    pub server_host: String,

    #[envconfig(from = "SERVER_PORT", default = "8080")]
    pub server_port: u16,

    // Worker fleet, comma-separated host:port entries. Fixed at startup.
    #[envconfig(from = "WORKER_URLS", default = "")]
    pub worker_urls: String,

    #[envconfig(from = "WORKER_TIMEOUT", default = "30")]
    pub worker_timeout_seconds: u64,

    // Artifact staging
    #[envconfig(from = "ARTIFACT_DIR", default = "/var/lib/drover/artifacts")]
    pub artifact_dir: String,
}

impl AppConfig {
    /// Load configuration from environment variables only
    pub fn load_from_env() -> Result<Self> {
        Ok(Self::init_from_env()?)
    }

    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.server_host.clone(),
            port: self.server_port,
        }
    }

    pub fn worker_urls(&self) -> Vec<String> {
        self.worker_urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}
