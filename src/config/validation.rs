//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the environment name and exporter address
//! - Check the log filter parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::environment::EnvironmentName;
use crate::config::schema::HostConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.host.application_name.trim().is_empty() {
        errors.push(ValidationError {
            field: "host.application_name",
            message: "must not be empty".to_string(),
        });
    }

    if let Err(e) = config.host.environment.parse::<EnvironmentName>() {
        errors.push(ValidationError {
            field: "host.environment",
            message: e.to_string(),
        });
    }

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        errors.push(ValidationError {
            field: "logging.level",
            message: e.to_string(),
        });
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "metrics.address",
            message: format!("`{}` is not a socket address", config.metrics.address),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&HostConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = HostConfig::default();
        config.host.application_name = " ".into();
        config.host.environment = "Qa".into();
        config.metrics.enabled = true;
        config.metrics.address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["host.application_name", "host.environment", "metrics.address"]
        );
    }

    #[test]
    fn test_disabled_metrics_address_is_not_checked() {
        let mut config = HostConfig::default();
        config.metrics.address = "nowhere".into();
        assert!(validate_config(&config).is_ok());
    }
}
