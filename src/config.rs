use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Identity sent with every outbound page and robots request
pub const DEFAULT_USER_AGENT: &str = "page2site-bot/1.0";

/// Errors loading configuration files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid listen address {0:?}")]
    ListenAddr(String),

    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Process-wide settings, loaded from an optional JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// User agent for page and robots fetches
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for the robots policy fetch
    #[serde(default = "default_robots_timeout_secs")]
    pub robots_timeout_secs: u64,

    /// Timeout for the page fetch
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Timeout for external image generation
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,

    /// Stylesheet copied into every export bundle
    #[serde(default = "default_stylesheet_path")]
    pub stylesheet_path: PathBuf,

    /// Optional JSON signature registry replacing the builtin one
    #[serde(default)]
    pub registry_path: Option<PathBuf>,

    /// Address the HTTP surface binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Table analyses are mirrored into when persistence is enabled
    #[serde(default = "default_persistence_table")]
    pub persistence_table: String,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_robots_timeout_secs() -> u64 {
    4
}

fn default_page_timeout_secs() -> u64 {
    10
}

fn default_image_timeout_secs() -> u64 {
    60
}

fn default_stylesheet_path() -> PathBuf {
    PathBuf::from("assets/miracle.css")
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_persistence_table() -> String {
    "analyses".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            robots_timeout_secs: default_robots_timeout_secs(),
            page_timeout_secs: default_page_timeout_secs(),
            image_timeout_secs: default_image_timeout_secs(),
            stylesheet_path: default_stylesheet_path(),
            registry_path: None,
            listen_addr: default_listen_addr(),
            persistence_table: default_persistence_table(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    /// Listen address, with the port replaced by `port` when given
    pub fn listen_addr(&self, port: Option<&str>) -> Result<SocketAddr, ConfigError> {
        let mut addr: SocketAddr = self
            .listen_addr
            .parse()
            .map_err(|_| ConfigError::ListenAddr(self.listen_addr.clone()))?;
        if let Some(port) = port {
            let port = port
                .parse()
                .map_err(|_| ConfigError::ListenAddr(port.to_string()))?;
            addr.set_port(port);
        }
        Ok(addr)
    }
}

/// Whether analyses are mirrored to the external store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    Enabled {
        base_url: String,
        api_key: String,
        table: String,
    },
    Disabled,
}

/// Which image generator serves `generate-image`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageBackendChoice {
    External { api_key: String },
    Fallback,
}

/// Optional external services, resolved once at startup and passed explicitly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub persistence: Persistence,
    pub image_backend: ImageBackendChoice,
}

impl Capabilities {
    /// Everything off: no persistence, placeholder images
    pub fn disabled() -> Self {
        Self {
            persistence: Persistence::Disabled,
            image_backend: ImageBackendChoice::Fallback,
        }
    }

    /// Resolve from the process environment
    pub fn from_env(config: &ServiceConfig) -> Self {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup; blank values count as absent
    pub fn from_lookup<F>(config: &ServiceConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let persistence = match (var("SUPABASE_URL"), var("SUPABASE_KEY")) {
            (Some(base_url), Some(api_key)) => Persistence::Enabled {
                base_url,
                api_key,
                table: config.persistence_table.clone(),
            },
            _ => Persistence::Disabled,
        };

        let image_backend = match var("HF_API_KEY") {
            Some(api_key) => ImageBackendChoice::External { api_key },
            None => ImageBackendChoice::Fallback,
        };

        ::log::info!(
            "capabilities: persistence={}, image backend={}",
            matches!(persistence, Persistence::Enabled { .. }),
            match image_backend {
                ImageBackendChoice::External { .. } => "external",
                ImageBackendChoice::Fallback => "fallback",
            }
        );

        Self {
            persistence,
            image_backend,
        }
    }
}
