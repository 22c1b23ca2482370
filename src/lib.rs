//! Process lifecycle host library.
//!
//! Drives an application through ordered startup and shutdown phases, fans
//! each phase out to registered participants and exposes the
//! `ApplicationStarted` / `ApplicationStopping` / `ApplicationStopped` gates.

pub mod builder;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod registry;

pub use builder::{BuildError, HostBuilder, HostContext};
pub use config::schema::HostConfig;
pub use error::{BoxError, LifecycleError, LifecycleResult};
pub use lifecycle::{
    Application, Capability, Host, LifecycleGate, LifecycleState, Participant, Phase, StartTask,
};
pub use registry::{Registry, RegistryBuilder, ServiceRegistry};
