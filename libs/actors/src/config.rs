//! Actor System Configuration
//!
//! Loads runtime settings from an optional TOML file with `ACTORS_*`
//! environment overrides layered on top of built-in defaults.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ActorError;

/// Environment variable prefix for overrides, e.g. `ACTORS_BALANCER=round_robin`
pub const ENV_PREFIX: &str = "ACTORS";

/// Selection policy used by the default router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BalancerKind {
    /// Uniform-random choice over the pool
    #[default]
    Random,
    /// Deterministic rotation over the pool
    RoundRobin,
}

/// Actor system settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Loop threads are named `<prefix>-<actor name>`
    pub thread_name_prefix: String,

    /// Balancer used by the default full-name router
    pub balancer: BalancerKind,

    /// Fixed seed for the random balancer (reproducible selection)
    pub balancer_seed: Option<u64>,

    /// Default log filter for binaries embedding the runtime
    pub log_level: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: "actor".to_string(),
            balancer: BalancerKind::Random,
            balancer_seed: None,
            log_level: "info".to_string(),
        }
    }
}

impl SystemConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading actor system config file");
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: SystemConfig = builder
            .build()
            .context("Failed to build actor system configuration")?
            .try_deserialize()
            .context("Failed to deserialize actor system configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the runtime cannot honor
    pub fn validate(&self) -> std::result::Result<(), ActorError> {
        if self.thread_name_prefix.trim().is_empty() {
            return Err(ActorError::configuration(
                "thread name prefix must not be empty",
                Some("thread_name_prefix"),
            ));
        }
        Ok(())
    }

    /// Thread name for an instance registered under `actor_name`
    pub fn thread_name(&self, actor_name: &str) -> String {
        format!("{}-{}", self.thread_name_prefix, actor_name)
    }
}
