//! Host environment description.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnvironmentName {
    #[default]
    Development,
    Staging,
    Production,
}

impl EnvironmentName {
    pub const ALL: [EnvironmentName; 3] = [
        EnvironmentName::Development,
        EnvironmentName::Staging,
        EnvironmentName::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentName::Development => "Development",
            EnvironmentName::Staging => "Staging",
            EnvironmentName::Production => "Production",
        }
    }

    pub fn is_development(&self) -> bool {
        *self == EnvironmentName::Development
    }
}

impl fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an environment name is not one of the known ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid environment name `{0}`, expected one of Development, Staging, Production")]
pub struct InvalidEnvironment(pub String);

impl FromStr for EnvironmentName {
    type Err = InvalidEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvironmentName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| InvalidEnvironment(s.to_string()))
    }
}

/// Where and as what the application is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub application_name: String,
    pub content_root: PathBuf,
    pub environment: EnvironmentName,
}

impl HostEnvironment {
    /// Describe the environment; the content root is made absolute when it
    /// exists on disk.
    pub fn new(
        application_name: impl Into<String>,
        content_root: impl AsRef<Path>,
        environment: &str,
    ) -> Result<Self, InvalidEnvironment> {
        let environment = environment.parse()?;
        let content_root = content_root.as_ref();
        let content_root = content_root
            .canonicalize()
            .unwrap_or_else(|_| content_root.to_path_buf());

        Ok(Self {
            application_name: application_name.into(),
            content_root,
            environment,
        })
    }
}
