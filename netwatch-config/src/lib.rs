//! # Netwatch Configuration System
//!
//! Hierarchical configuration management for the netwatch agent.
//!
//! ## Features
//! - **Unified Configuration**: Single source of truth across all components
//! - **Validation**: Runtime validation of critical parameters
//! - **Environment Awareness**: `NETWATCH_*` variables override any file value

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod agent;
mod backend;
mod bus;
mod capture;
mod error;
mod pipeline;
mod validation;

pub use agent::AgentConfig;
pub use backend::AuthConfig;
pub use backend::BackendConfig;
pub use bus::BusConfig;
pub use bus::HeartbeatConfig;
pub use bus::TopicsConfig;
pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use pipeline::PipelineConfig;

/// Top-level configuration container for all netwatch components.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct NetwatchConfig {
    /// Agent identity (id, monitored interface, reported address).
    #[validate(nested)]
    #[serde(default)]
    pub agent: AgentConfig,

    /// Packet capture parameters.
    #[validate(nested)]
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Aggregation and batching parameters.
    #[validate(nested)]
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Batch collector endpoint.
    #[validate(nested)]
    #[serde(default)]
    pub backend: BackendConfig,

    /// Token endpoint credentials.
    #[validate(nested)]
    #[serde(default)]
    pub auth: AuthConfig,

    /// Streaming message bus endpoints and topics.
    #[validate(nested)]
    #[serde(default)]
    pub bus: BusConfig,

    /// Liveness heartbeat parameters.
    #[validate(nested)]
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
}

impl NetwatchConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/netwatch.yaml` - base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - environment-specific overrides.
    /// 4. `NETWATCH_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Start with defaults.
        let mut figment = Figment::from(Serialized::defaults(NetwatchConfig::default()));

        if Path::new("config/netwatch.yaml").exists() {
            figment = figment.merge(Yaml::file("config/netwatch.yaml"));
        }

        let env = std::env::var("NETWATCH_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        figment
            .merge(Env::prefixed("NETWATCH_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Re-checks all validation rules, for configs mutated after loading.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    /// Load configuration from a specific path for testing/validation.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(NetwatchConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("NETWATCH_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}
