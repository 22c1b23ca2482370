//! Host composition root.
//!
//! # Data Flow
//! ```text
//! HostBuilder::new(environment)
//!     → configure_host_configuration  (host layer)
//!     → configure_app_configuration   (app layer, on top of the host layer)
//!     → configure_services            (participants, values, disposers)
//!     → bind_options                  (named configuration values)
//!     → build_with(app factory)
//!         → ServiceRegistry → configure_registry hooks → Host
//! ```
//!
//! # Design Decisions
//! - Delegates run in registration order within each stage
//! - `build` consumes the builder, so a host can only be built once
//! - The environment and final configuration are registered as values
//!   `environment` and `configuration`

use std::sync::Arc;

use thiserror::Error;

use crate::config::{HostConfig, HostEnvironment, InvalidEnvironment};
use crate::lifecycle::{Application, Host};
use crate::registry::{Registry, RegistryBuilder, ServiceRegistry};

/// Registry key of the serialized [`HostEnvironment`].
pub const ENVIRONMENT_KEY: &str = "environment";

/// Registry key of the final configuration table.
pub const CONFIGURATION_KEY: &str = "configuration";

/// Errors raised while building a host.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Environment(#[from] InvalidEnvironment),

    #[error("host environment could not be registered: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// What delegates see while the host is being built.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub environment: HostEnvironment,
    /// Host layer while app configuration runs; the merged result afterwards.
    pub configuration: toml::Table,
}

type HostConfigDelegate = Box<dyn FnOnce(&mut toml::Table)>;
type AppConfigDelegate = Box<dyn FnOnce(&HostContext, &mut toml::Table)>;
type ServicesDelegate = Box<dyn FnOnce(&HostContext, &mut RegistryBuilder)>;
type OptionsSelector = Box<dyn FnOnce(&toml::Table) -> Option<toml::Value>>;
type RegistryDelegate = Box<dyn FnOnce(&HostContext, &ServiceRegistry)>;

/// Builds a [`Host`] from configuration layers and service registrations.
pub struct HostBuilder {
    environment: HostEnvironment,
    host_configuration: Vec<HostConfigDelegate>,
    app_configuration: Vec<AppConfigDelegate>,
    services: Vec<ServicesDelegate>,
    options: Vec<(String, OptionsSelector)>,
    registry_hooks: Vec<RegistryDelegate>,
}

impl HostBuilder {
    pub fn new(environment: HostEnvironment) -> Self {
        Self {
            environment,
            host_configuration: Vec::new(),
            app_configuration: Vec::new(),
            services: Vec::new(),
            options: Vec::new(),
            registry_hooks: Vec::new(),
        }
    }

    /// Start from a loaded configuration: its `[host]` section becomes the
    /// environment and its `[options]` table seeds the host layer.
    pub fn from_config(config: &HostConfig) -> Result<Self, BuildError> {
        let options = config.options.clone();
        let mut builder = Self::new(config.environment()?);
        builder.configure_host_configuration(move |table| table.extend(options));
        Ok(builder)
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    pub fn configure_host_configuration<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&mut toml::Table) + 'static,
    {
        self.host_configuration.push(Box::new(configure));
        self
    }

    pub fn configure_app_configuration<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&HostContext, &mut toml::Table) + 'static,
    {
        self.app_configuration.push(Box::new(configure));
        self
    }

    pub fn configure_services<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&HostContext, &mut RegistryBuilder) + 'static,
    {
        self.services.push(Box::new(configure));
        self
    }

    /// Register the value picked by `select` from the final configuration
    /// under `name`. Nothing is registered when `select` returns `None`.
    pub fn bind_options<F>(&mut self, name: impl Into<String>, select: F) -> &mut Self
    where
        F: FnOnce(&toml::Table) -> Option<toml::Value> + 'static,
    {
        self.options.push((name.into(), Box::new(select)));
        self
    }

    /// Run `configure` against the finished registry, before the host exists.
    pub fn configure_registry<F>(&mut self, configure: F) -> &mut Self
    where
        F: FnOnce(&HostContext, &ServiceRegistry) + 'static,
    {
        self.registry_hooks.push(Box::new(configure));
        self
    }

    /// Build the host around an existing application.
    pub fn build<A: Application>(self, app: A) -> Result<Host, BuildError> {
        self.build_with(move |_, _| app)
    }

    /// Build the host, creating the application once the registry exists.
    pub fn build_with<A, F>(self, make_app: F) -> Result<Host, BuildError>
    where
        A: Application,
        F: FnOnce(&HostContext, Arc<dyn Registry>) -> A,
    {
        // host configuration first
        let mut host_layer = toml::Table::new();
        for configure in self.host_configuration {
            configure(&mut host_layer);
        }
        let mut context = HostContext {
            environment: self.environment,
            configuration: host_layer.clone(),
        };

        // application configuration on top of it
        let mut app_layer = host_layer;
        for configure in self.app_configuration {
            configure(&context, &mut app_layer);
        }
        context.configuration = app_layer;

        // services last
        let mut registrations = RegistryBuilder::new();
        registrations
            .add_value(ENVIRONMENT_KEY, toml::Value::try_from(&context.environment)?)
            .add_value(CONFIGURATION_KEY, context.configuration.clone());

        for configure in self.services {
            configure(&context, &mut registrations);
        }

        for (name, select) in self.options {
            match select(&context.configuration) {
                Some(value) => {
                    registrations.add_value(name, value);
                }
                None => tracing::debug!(options = %name, "No configuration bound for options"),
            }
        }

        let registry = registrations.build();
        for configure in self.registry_hooks {
            configure(&context, &registry);
        }

        let registry: Arc<dyn Registry> = Arc::new(registry);
        let app = make_app(&context, Arc::clone(&registry));

        tracing::debug!(
            application = %context.environment.application_name,
            environment = %context.environment.environment,
            "Host built"
        );
        Ok(Host::with_environment(Arc::new(app), registry, context.environment))
    }
}
