use std::time::Duration;

use anyhow::Result;
use bgd_state_storage::ActiveVersion;
use envconfig::Envconfig;
use tracing::warn;

#[derive(Debug, Clone, Envconfig)]
pub struct AppConfig {
    // Server configuration
    #[envconfig(from = "SERVER_HOST", default = "0.0.0.0")]
    pub server_host: String,

    #[envconfig(from = "SERVER_PORT", default = "8000")]
    pub server_port: u16,

    // Observability
    #[envconfig(from = "LOG_LEVEL", default = "info")]
    pub log_level: String,

    #[envconfig(from = "LOG_FORMAT", default = "plain")]
    pub log_format: String,

    // Active-version record
    #[envconfig(from = "STATE_STORE", default = "file")]
    pub state_store: String,

    #[envconfig(from = "STATE_FILE", default = "data/active_version")]
    pub state_file: String,

    // Admin sessions
    #[envconfig(from = "SESSION_SECRET", default = "dev-session-secret")]
    pub session_secret: String,

    #[envconfig(from = "SESSION_TTL", default = "28800")]
    pub session_ttl_seconds: u64,

    #[envconfig(from = "ADMIN_USERNAME", default = "admin")]
    pub admin_username: String,

    #[envconfig(from = "ADMIN_PASSWORD", default = "admin")]
    pub admin_password: String,

    // Bearer tokens for the data plane
    #[envconfig(from = "JWT_SECRET", default = "dev-jwt-secret")]
    pub jwt_secret: String,

    #[envconfig(from = "JWT_ALGORITHM", default = "HS256")]
    pub jwt_algorithm: String,

    #[envconfig(from = "TOKEN_TTL", default = "3600")]
    pub token_ttl_seconds: u64,

    // Blue/green backends
    #[envconfig(from = "BLUE_BACKEND_URL", default = "http://service1-blue:5000")]
    pub blue_backend_url: String,

    #[envconfig(
        from = "GREEN_BACKEND_URL",
        default = "http://service1-green:5000"
    )]
    pub green_backend_url: String,

    #[envconfig(from = "BLUE_CONTAINER", default = "service1-blue")]
    pub blue_container: String,

    #[envconfig(from = "GREEN_CONTAINER", default = "service1-green")]
    pub green_container: String,

    #[envconfig(from = "BACKEND_TIMEOUT", default = "5")]
    pub backend_timeout_seconds: u64,

    /// Extra infrastructure containers shown on the dashboard.
    #[envconfig(from = "MONITORED_CONTAINERS", default = "storage")]
    pub monitored_containers: String,

    // Container runtime (Docker Engine API)
    #[envconfig(from = "DOCKER_URL", default = "http://localhost:2375")]
    pub docker_url: String,

    #[envconfig(from = "DOCKER_API_VERSION", default = "v1.43")]
    pub docker_api_version: String,

    #[envconfig(from = "RUNTIME_TIMEOUT", default = "5")]
    pub runtime_timeout_seconds: u64,

    /// Seconds the daemon waits before killing a container being stopped.
    /// Kept below RUNTIME_TIMEOUT so the stop call itself does not time out.
    #[envconfig(from = "RUNTIME_STOP_GRACE", default = "3")]
    pub runtime_stop_grace_seconds: u64,

    // Log-storage collaborator
    #[envconfig(from = "STORAGE_URL", default = "http://storage:5000")]
    pub storage_url: String,

    #[envconfig(from = "STORAGE_TIMEOUT", default = "5")]
    pub storage_timeout_seconds: u64,

    // External reverse proxy
    #[envconfig(from = "PROXY_RELOAD_URL")]
    pub proxy_reload_url: Option<String>,
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

    pub fn storage(&self) -> StorageConfig {
        let store_type = match self.state_store.to_lowercase().as_str() {
            "file" => StoreType::File,
            "memory" => StoreType::Memory,
            other => {
                warn!(
                    "Unrecognized state store '{}', falling back to 'file'.",
                    other
                );
                StoreType::File
            }
        };
        StorageConfig {
            store_type,
            state_file: self.state_file.clone(),
        }
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            session_secret: self.session_secret.clone(),
            session_ttl: Duration::from_secs(self.session_ttl_seconds),
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_algorithm: self.jwt_algorithm.clone(),
            token_ttl: Duration::from_secs(self.token_ttl_seconds),
        }
    }

    pub fn slots(&self) -> SlotConfig {
        SlotConfig {
            blue: SlotTarget {
                container: self.blue_container.clone(),
                url: trim_url(&self.blue_backend_url),
            },
            green: SlotTarget {
                container: self.green_container.clone(),
                url: trim_url(&self.green_backend_url),
            },
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_seconds)
    }

    pub fn monitored_containers(&self) -> Vec<String> {
        self.monitored_containers
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            docker_url: trim_url(&self.docker_url),
            api_version: self.docker_api_version.trim_matches('/').to_string(),
            timeout: Duration::from_secs(self.runtime_timeout_seconds),
            stop_grace: Duration::from_secs(self.runtime_stop_grace_seconds),
        }
    }

    pub fn log_storage(&self) -> LogStorageConfig {
        LogStorageConfig {
            url: trim_url(&self.storage_url),
            timeout: Duration::from_secs(self.storage_timeout_seconds),
        }
    }

    pub fn reload(&self) -> Option<ReloadConfig> {
        self.proxy_reload_url
            .as_ref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| ReloadConfig {
                url: url.trim().to_string(),
                timeout: self.backend_timeout(),
            })
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreType {
    File,
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub store_type: StoreType,
    pub state_file: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl: Duration,
    pub admin_username: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    pub token_ttl: Duration,
}

/// Where a slot's backend lives: its container name and its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotTarget {
    pub container: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotConfig {
    pub blue: SlotTarget,
    pub green: SlotTarget,
}

impl SlotConfig {
    pub fn target(&self, version: ActiveVersion) -> &SlotTarget {
        match version {
            ActiveVersion::Blue => &self.blue,
            ActiveVersion::Green => &self.green,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub docker_url: String,
    pub api_version: String,
    pub timeout: Duration,
    pub stop_grace: Duration,
}

#[derive(Debug, Clone)]
pub struct LogStorageConfig {
    pub url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ReloadConfig {
    pub url: String,
    pub timeout: Duration,
}
