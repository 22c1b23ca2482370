//! The lifecycle host: phase sequencing, gates and teardown.
//!
//! # State Machine
//! ```text
//! Created → Starting → Running → Stopping → Stopped
//!              │                     │
//!              └──────→ Faulted ←────┘
//! ```
//!
//! # Design Decisions
//! - One start and one stop per host; a start after stop is rejected
//! - A second stop waits for the first one instead of running again
//! - `ApplicationStopping` fires before any stop-phase work and
//!   `ApplicationStopped` fires from a drop guard, so it fires on every exit path
//! - Every start surface funnels into the same async sequence

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::HostEnvironment;
use crate::error::{LifecycleError, LifecycleResult};
use crate::lifecycle::entry::EntryPointRunner;
use crate::lifecycle::gate::{FireOnDrop, GateKind, LifecycleGate};
use crate::lifecycle::invoker::ParticipantInvoker;
use crate::lifecycle::participant::Application;
use crate::lifecycle::phase::{Capability, Phase};
use crate::registry::Registry;

/// Host lifecycle state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Stopped = 4,
    Faulted = 5,
}

impl From<u8> for LifecycleState {
    fn from(val: u8) -> Self {
        match val {
            1 => LifecycleState::Starting,
            2 => LifecycleState::Running,
            3 => LifecycleState::Stopping,
            4 => LifecycleState::Stopped,
            5 => LifecycleState::Faulted,
            _ => LifecycleState::Created,
        }
    }
}

struct HostInner {
    app: Arc<dyn Application>,
    registry: Arc<dyn Registry>,
    environment: Option<HostEnvironment>,
    started: LifecycleGate,
    stopping: LifecycleGate,
    stopped: LifecycleGate,
    state: AtomicU8,
    start_entered: AtomicBool,
    stop_entered: AtomicBool,
    disposed: AtomicBool,
}

/// Drives an [`Application`] and its registered participants through the
/// startup and shutdown phases.
///
/// Cloning yields another handle to the same host.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

impl Host {
    /// Create a host over an application and the registry it resolves
    /// participants from.
    pub fn new(app: Arc<dyn Application>, registry: Arc<dyn Registry>) -> Self {
        Self::build(app, registry, None)
    }

    /// Create a host that also describes the environment it runs in.
    pub fn with_environment(
        app: Arc<dyn Application>,
        registry: Arc<dyn Registry>,
        environment: HostEnvironment,
    ) -> Self {
        Self::build(app, registry, Some(environment))
    }

    fn build(
        app: Arc<dyn Application>,
        registry: Arc<dyn Registry>,
        environment: Option<HostEnvironment>,
    ) -> Self {
        Self {
            inner: Arc::new(HostInner {
                app,
                registry,
                environment,
                started: LifecycleGate::new(GateKind::Started),
                stopping: LifecycleGate::new(GateKind::Stopping),
                stopped: LifecycleGate::new(GateKind::Stopped),
                state: AtomicU8::new(LifecycleState::Created as u8),
                start_entered: AtomicBool::new(false),
                stop_entered: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.state()
    }

    /// The registry participants are resolved from.
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.inner.registry
    }

    /// The environment the host was built for, if any.
    pub fn environment(&self) -> Option<&HostEnvironment> {
        self.inner.environment.as_ref()
    }

    /// Fires once every start-phase participant completed.
    pub fn application_started(&self) -> &LifecycleGate {
        &self.inner.started
    }

    /// Fires when shutdown begins, before any stop-phase participant runs.
    pub fn application_stopping(&self) -> &LifecycleGate {
        &self.inner.stopping
    }

    /// Fires when shutdown completed, whether or not it succeeded.
    pub fn application_stopped(&self) -> &LifecycleGate {
        &self.inner.stopped
    }

    /// Whether the host has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Run the start sequence, including the entry point, to completion.
    ///
    /// Fails with [`LifecycleError::StartAborted`] if `abort_start` is
    /// canceled by the time post-start completed; the entry point is then
    /// never invoked.
    pub async fn start(&self, abort_start: CancellationToken) -> LifecycleResult<()> {
        self.inner.start_sequence(&abort_start).await
    }

    /// Run the start sequence as a background task on the current runtime.
    pub fn spawn(&self, abort_start: CancellationToken) -> LifecycleResult<StartTask> {
        let runtime = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;
        let host = self.clone();
        let handle = runtime.spawn(async move { host.start(abort_start).await });
        Ok(StartTask { handle })
    }

    /// Run the start sequence, blocking the calling thread until it completes.
    ///
    /// Needs an entered multi-threaded tokio runtime.
    pub fn start_blocking(&self, abort_start: CancellationToken) -> LifecycleResult<()> {
        block_on(self.start(abort_start))?
    }

    /// Run the stop sequence. Only the first call does anything; later
    /// calls wait until `ApplicationStopped` fired and return `Ok`.
    ///
    /// Calling it again from inside a stop-phase participant never returns.
    pub async fn stop(&self, graceful: CancellationToken) -> LifecycleResult<()> {
        if self.inner.stop_entered.swap(true, Ordering::AcqRel) {
            tracing::trace!("stop already requested, waiting for it");
            self.inner.stopped.signaled().await;
            return Ok(());
        }
        self.inner.stop_sequence(&graceful).await
    }

    /// Run the stop sequence, blocking the calling thread until it completes.
    pub fn stop_blocking(&self, graceful: CancellationToken) -> LifecycleResult<()> {
        block_on(self.stop(graceful))?
    }

    /// Request a graceful stop and wait for it.
    pub fn stop_application(&self) -> LifecycleResult<()> {
        self.stop_blocking(CancellationToken::new())
    }

    /// Wait until `ApplicationStopped` fired.
    pub async fn wait_for_stop(&self) {
        self.inner.stopped.signaled().await;
    }

    /// Stop as fast as safely possible, then release the registry.
    ///
    /// Only the first call has any effect. A stop already in flight is
    /// awaited first. The registry is released even when the stop sequence
    /// fails.
    pub async fn dispose(&self) -> LifecycleResult<()> {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let abort = CancellationToken::new();
        abort.cancel();
        let result = self.stop(abort).await;

        self.inner.registry.dispose();
        tracing::trace!("host disposed");
        result
    }

    /// Blocking variant of [`Host::dispose`].
    pub fn dispose_blocking(&self) -> LifecycleResult<()> {
        block_on(self.dispose())?
    }
}

/// Background start sequence returned by [`Host::spawn`].
#[derive(Debug)]
pub struct StartTask {
    handle: JoinHandle<LifecycleResult<()>>,
}

impl StartTask {
    /// Whether the start sequence, entry point included, has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the task. `ApplicationStarted` does not fire if it had not yet.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Wait for the start sequence to return.
    pub async fn join(self) -> LifecycleResult<()> {
        self.handle.await?
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("state", &self.state())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl HostInner {
    fn state(&self) -> LifecycleState {
        LifecycleState::from(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move `from → to`; returns false when another transition won.
    fn transition(&self, from: LifecycleState, to: LifecycleState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move to `to` unless the host already faulted.
    fn advance(&self, to: LifecycleState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != LifecycleState::Faulted as u8).then_some(to as u8)
            });
    }

    fn fault(&self, err: &LifecycleError) {
        self.set_state(LifecycleState::Faulted);
        log_fatal(err);
    }

    async fn start_sequence(&self, abort_start: &CancellationToken) -> LifecycleResult<()> {
        tracing::trace!("start application");

        if self.disposed.load(Ordering::Acquire) {
            return Err(reject(LifecycleError::AlreadyDisposed));
        }
        if self.stop_entered.load(Ordering::Acquire) {
            return Err(reject(LifecycleError::AlreadyStopped));
        }
        if self.start_entered.swap(true, Ordering::AcqRel) {
            let err = LifecycleError::AlreadyStarted;
            self.fault(&err);
            return Err(err);
        }
        // A stop that raced past the check above already left `Created`.
        if !self.transition(LifecycleState::Created, LifecycleState::Starting) {
            return Err(reject(LifecycleError::AlreadyStopped));
        }

        match self.startup(abort_start).await {
            Ok(()) => Ok(()),
            Err(LifecycleError::StartAborted) => {
                // Participants are up and stay up; the caller still owns the stop.
                Err(reject(LifecycleError::StartAborted))
            }
            Err(err) => {
                self.fault(&err);
                Err(err)
            }
        }
    }

    async fn startup(&self, abort_start: &CancellationToken) -> LifecycleResult<()> {
        let invoker = ParticipantInvoker::new(self.registry.as_ref());

        invoker.invoke(Capability::PreStart, abort_start).await?;
        invoker.invoke(Capability::Start, abort_start).await?;
        tracing::trace!("trigger Application::start");
        self.app
            .start(abort_start)
            .await
            .map_err(|source| LifecycleError::Hook {
                phase: Phase::Start,
                source,
            })?;
        invoker.invoke(Capability::PostStart, abort_start).await?;

        self.transition(LifecycleState::Starting, LifecycleState::Running);
        self.started.fire();

        EntryPointRunner::new(self.app.as_ref()).run(abort_start).await
    }

    async fn stop_sequence(&self, graceful: &CancellationToken) -> LifecycleResult<()> {
        tracing::trace!("stop application");
        let _stopped = FireOnDrop::new(&self.stopped);

        self.advance(LifecycleState::Stopping);
        self.stopping.fire();

        match self.shutdown(graceful).await {
            Ok(()) => {
                self.advance(LifecycleState::Stopped);
                Ok(())
            }
            Err(err) => {
                self.fault(&err);
                Err(err)
            }
        }
    }

    async fn shutdown(&self, graceful: &CancellationToken) -> LifecycleResult<()> {
        let invoker = ParticipantInvoker::new(self.registry.as_ref());

        invoker.invoke(Capability::PreStop, graceful).await?;
        invoker.invoke(Capability::Stop, graceful).await?;
        tracing::trace!("trigger Application::stop");
        self.app
            .stop(graceful)
            .await
            .map_err(|source| LifecycleError::Hook {
                phase: Phase::Stop,
                source,
            })?;
        invoker.invoke(Capability::PostStop, graceful).await
    }
}

fn log_fatal(err: &LifecycleError) {
    tracing::error!(
        fatal = true,
        phase = ?err.phase(),
        error = %err,
        "uncaught lifecycle fault"
    );
}

/// Log `err` as fatal without touching the state.
fn reject(err: LifecycleError) -> LifecycleError {
    log_fatal(&err);
    err
}

/// Block the calling thread on `fut` using the current multi-threaded runtime.
fn block_on<F: Future>(fut: F) -> LifecycleResult<F::Output> {
    let handle = Handle::try_current().map_err(|_| LifecycleError::NoRuntime)?;
    if handle.runtime_flavor() != RuntimeFlavor::MultiThread {
        return Err(LifecycleError::NoRuntime);
    }
    Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
}
