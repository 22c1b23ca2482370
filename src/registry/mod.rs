//! Collaborator registry subsystem.
//!
//! # Data Flow
//! ```text
//! Composition root (builder.rs / tests):
//!     RegistryBuilder
//!         → add_hosted_service / add_lifecycle_participant / add_participant
//!         → add_value (named configuration values)
//!         → add_disposer (owned resources)
//!     → ServiceRegistry (immutable registrations)
//!
//! Host:
//!     resolve_all(capability) → ordered participants for one phase
//!     resolve_value(key)      → configuration value
//!     dispose()               → release owned resources, once
//! ```
//!
//! # Design Decisions
//! - Resolution order is registration order, per capability
//! - The host only sees the `Registry` trait, never a global container
//! - Participants are resolved per phase; the host keeps no references

pub mod service;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::lifecycle::participant::Participant;
use crate::lifecycle::phase::Capability;

pub use service::{RegistryBuilder, ServiceRegistry};

/// Errors raised by registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry was disposed and no longer resolves anything.
    #[error("registry has been disposed")]
    Disposed,

    /// No value is registered under the key.
    #[error("no configuration value registered under `{0}`")]
    Missing(String),

    /// The value exists but does not fit the requested type.
    #[error("configuration value `{key}` could not be bound: {source}")]
    Bind {
        key: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolves participants and configuration values for the host.
pub trait Registry: Send + Sync {
    /// Every participant registered for `capability`, in registration order.
    fn resolve_all(
        &self,
        capability: Capability,
    ) -> Result<Vec<Arc<dyn Participant>>, RegistryError>;

    /// The configuration value registered under `key`.
    fn resolve_value(&self, key: &str) -> Result<Option<toml::Value>, RegistryError>;

    /// Release owned resources. Later calls are no-ops.
    fn dispose(&self);

    /// Whether `dispose` has run.
    fn is_disposed(&self) -> bool;
}

impl dyn Registry {
    /// Resolve and bind a configuration value to `T`.
    pub fn resolve<T: DeserializeOwned>(&self, key: &str) -> Result<T, RegistryError> {
        let value = self
            .resolve_value(key)?
            .ok_or_else(|| RegistryError::Missing(key.to_string()))?;
        value.try_into::<T>().map_err(|source| RegistryError::Bind {
            key: key.to_string(),
            source,
        })
    }
}
