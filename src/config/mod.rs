//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → HostBuilder layers it under the app configuration
//!     → named option sections resolvable through the registry
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::{EnvironmentName, HostEnvironment, InvalidEnvironment};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{HostConfig, LogFormat, LoggingConfig, MetricsConfig};
