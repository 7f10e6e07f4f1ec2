//! Actor Runtime Error Types
//!
//! Failures surfaced to callers of the actor system: routing misses,
//! removal misses, bounded-wait expiry and thread spawn failures.

use crate::registry::ActorId;
use thiserror::Error;

/// Main actor runtime error type
#[derive(Error, Debug)]
pub enum ActorError {
    /// No pool is registered under the target name
    #[error("Unable to find actor match {name}")]
    NotFound { name: String },

    /// The pool exists but does not contain the target instance
    #[error("Actor {id} not in pool {name}")]
    InstanceNotFound { name: String, id: ActorId },

    /// Require exceeded its bound waiting for a response
    #[error("Require to {actor} timed out after {timeout_ms}ms")]
    Timeout { actor: String, timeout_ms: u64 },

    /// The instance stopped before writing to the response slot
    #[error("Actor {actor} stopped before replying")]
    Abandoned { actor: String },

    /// The loop thread for a new instance could not be spawned
    #[error("Failed to spawn loop thread for actor {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid runtime configuration
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },
}

/// Result type alias for actor runtime operations
pub type Result<T> = std::result::Result<T, ActorError>;

impl ActorError {
    /// Create a routing miss error
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create a removal miss error
    pub fn instance_not_found(name: impl Into<String>, id: ActorId) -> Self {
        Self::InstanceNotFound {
            name: name.into(),
            id,
        }
    }

    /// Create a timeout error
    pub fn timeout(actor: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            actor: actor.into(),
            timeout_ms,
        }
    }

    /// Create an abandoned-reply error
    pub fn abandoned(actor: impl Into<String>) -> Self {
        Self::Abandoned {
            actor: actor.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// True for both routing and removal misses
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ActorError::NotFound { .. } | ActorError::InstanceNotFound { .. }
        )
    }

    /// True when the error came from a bounded require expiring
    pub fn is_timeout(&self) -> bool {
        matches!(self, ActorError::Timeout { .. })
    }

    /// Check if a caller-side retry could succeed
    ///
    /// The runtime never retries on its own; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            ActorError::Timeout { .. } => true,
            ActorError::Abandoned { .. } => true,
            ActorError::NotFound { .. } => false,
            ActorError::InstanceNotFound { .. } => false,
            ActorError::Spawn { .. } => false,
            ActorError::Configuration { .. } => false,
        }
    }

    /// Get error category for metrics and log fields
    pub fn category(&self) -> &'static str {
        match self {
            ActorError::NotFound { .. } => "not_found",
            ActorError::InstanceNotFound { .. } => "instance_not_found",
            ActorError::Timeout { .. } => "timeout",
            ActorError::Abandoned { .. } => "abandoned",
            ActorError::Spawn { .. } => "spawn",
            ActorError::Configuration { .. } => "configuration",
        }
    }
}
