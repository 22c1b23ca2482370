//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::config::environment::{HostEnvironment, InvalidEnvironment};

/// Root configuration for a lifecycle host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Application identity and environment.
    pub host: HostSection,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Metrics exporter settings.
    pub metrics: MetricsConfig,

    /// Named option sections, resolvable through the registry.
    pub options: toml::Table,
}

impl HostConfig {
    /// Build the host environment described by `[host]`.
    pub fn environment(&self) -> Result<HostEnvironment, InvalidEnvironment> {
        HostEnvironment::new(
            self.host.application_name.clone(),
            &self.host.content_root,
            &self.host.environment,
        )
    }
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostSection {
    /// Application name used in logs.
    pub application_name: String,

    /// Development, Staging or Production.
    pub environment: String,

    /// Content root directory.
    pub content_root: String,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            application_name: "lifecycle-host".to_string(),
            environment: "Development".to_string(),
            content_root: ".".to_string(),
        }
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive). `RUST_LOG` takes precedence.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter.
    pub enabled: bool,

    /// Exporter bind address.
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: "127.0.0.1:9090".to_string(),
        }
    }
}
