// Re-export modules
pub mod config;
pub mod error;
pub mod fetchers;
pub mod imagery;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod server;
pub mod sink;
pub mod synth;
pub mod target;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{Capabilities, ServiceConfig};
pub use error::{AnalysisError, ErrorBody, SynthesisError};
pub use pipeline::Pipeline;
pub use results::{Analysis, Project};
pub use server::AppState;
pub use synth::{Bundle, Synthesizer};

use config::ConfigError;
use parsers::signatures::SignatureRegistry;
use std::path::Path;
use std::sync::Arc;

/// Builder that wires configuration and capabilities into the app's collaborators
pub struct Service {
    config: ServiceConfig,
    capabilities: Option<Capabilities>,
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

impl Service {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
            capabilities: None,
        }
    }

    /// Use the given configuration
    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ServiceConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, ConfigError> {
        let config = ServiceConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Use explicit capabilities instead of reading the environment
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve capabilities once and build the shared state
    pub fn build(self) -> Result<AppState, ConfigError> {
        let capabilities = self
            .capabilities
            .unwrap_or_else(|| Capabilities::from_env(&self.config));

        let registry = match &self.config.registry_path {
            Some(path) => {
                ::log::info!("Loading signature registry from {}", path.display());
                SignatureRegistry::from_file(path)?
            }
            None => SignatureRegistry::builtin(),
        };

        let pipeline =
            Pipeline::new(&self.config, &capabilities)?.with_registry(Arc::new(registry));

        Ok(AppState {
            pipeline,
            synthesizer: Synthesizer::new(&self.config.stylesheet_path),
            image_backend: imagery::backend_for(
                &capabilities.image_backend,
                self.config.image_timeout(),
            )?,
        })
    }
}
