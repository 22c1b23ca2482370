//! Lifecycle host demo binary.
//!
//! # Lifecycle Overview
//!
//! ```text
//!   start(token)                                   stop(token) / dispose()
//!   ────────────                                   ───────────────────────
//!   pre_start participants                         fire ApplicationStopping
//!   start participants                             pre_stop participants
//!   Application::start                             stop participants
//!   post_start participants                        Application::stop
//!   fire ApplicationStarted                        post_stop participants
//!   Application::run  (entry point)                fire ApplicationStopped (always)
//! ```
//!
//! Runs until SIGINT/SIGTERM, or returns right after startup with `--once`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use lifecycle_host::builder::ENVIRONMENT_KEY;
use lifecycle_host::config::{load_config, HostEnvironment};
use lifecycle_host::lifecycle::signals::shutdown_signal;
use lifecycle_host::observability::{logging::init_logging, metrics::init_metrics};
use lifecycle_host::{Application, BoxError, HostBuilder, HostConfig, Participant, Registry};

#[derive(Parser)]
#[command(name = "lifecycle-host")]
#[command(
    about = "Runs an application through ordered startup and shutdown phases",
    long_about = None
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `[host].environment`.
    #[arg(short, long)]
    environment: Option<String>,

    /// Return from the entry point immediately instead of waiting for a signal.
    #[arg(long)]
    once: bool,
}

/// Logs every phase it takes part in.
struct PhaseLogger;

#[async_trait]
impl Participant for PhaseLogger {
    fn name(&self) -> &str {
        "phase-logger"
    }

    async fn pre_start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        tracing::info!("Starting up");
        Ok(())
    }

    async fn post_start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        tracing::info!("Started");
        Ok(())
    }

    async fn pre_stop(&self, graceful: &CancellationToken) -> Result<(), BoxError> {
        tracing::info!(fast = graceful.is_cancelled(), "Shutting down");
        Ok(())
    }

    async fn post_stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        tracing::info!("Stopped");
        Ok(())
    }
}

/// Hosted service reporting how long it was up.
#[derive(Default)]
struct Uptime {
    started_at: Mutex<Option<Instant>>,
}

#[async_trait]
impl Participant for Uptime {
    fn name(&self) -> &str {
        "uptime"
    }

    async fn start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        *self.started_at.lock().map_err(|e| e.to_string())? = Some(Instant::now());
        Ok(())
    }

    async fn stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        let started_at = *self.started_at.lock().map_err(|e| e.to_string())?;
        if let Some(started_at) = started_at {
            tracing::info!(uptime_ms = started_at.elapsed().as_millis() as u64, "Uptime");
        }
        Ok(())
    }
}

struct DemoApp {
    registry: Arc<dyn Registry>,
    once: bool,
}

#[async_trait]
impl Application for DemoApp {
    async fn start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    async fn run(&self) -> Result<(), BoxError> {
        let env: HostEnvironment = self.registry.resolve(ENVIRONMENT_KEY)?;
        let greeting = self
            .registry
            .resolve::<String>("greeting")
            .unwrap_or_else(|_| "hello".to_string());

        tracing::info!(
            application = %env.application_name,
            environment = %env.environment,
            content_root = %env.content_root.display(),
            "{greeting}"
        );

        if !self.once {
            shutdown_signal().await?;
        }
        Ok(())
    }

    async fn stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(environment) = cli.environment {
        config.host.environment = environment;
    }

    init_logging(&config.logging)?;

    if config.metrics.enabled {
        let addr: SocketAddr = config.metrics.address.parse()?;
        init_metrics(addr)?;
    }

    tracing::info!(
        application = %config.host.application_name,
        environment = %config.host.environment,
        "lifecycle-host v0.1.0 starting"
    );

    let mut builder = HostBuilder::from_config(&config)?;
    builder
        .configure_services(|_, services| {
            services
                .add_lifecycle_participant(PhaseLogger)
                .add_hosted_service(Uptime::default());
        })
        .bind_options("greeting", |config| config.get("greeting").cloned());

    let once = cli.once;
    let host = builder.build_with(|_, registry| DemoApp { registry, once })?;

    let started = host.start(CancellationToken::new()).await;
    let disposed = host.dispose().await;
    started?;
    disposed?;

    tracing::info!("Shutdown complete");
    Ok(())
}
