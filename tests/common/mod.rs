//! Shared fixtures for lifecycle integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use lifecycle_host::{Application, BoxError, Capability, Host, Participant, RegistryBuilder};

/// Ordered record of everything that happened.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events starting with `prefix`.
    #[allow(dead_code)]
    pub fn filtered(&self, prefix: &str) -> Vec<String> {
        self.events().into_iter().filter(|e| e.starts_with(prefix)).collect()
    }
}

/// A participant that logs `name:phase-begin` / `name:phase-end`.
pub struct Recorder {
    name: &'static str,
    log: EventLog,
    fail_on: Option<Capability>,
    delay: Duration,
}

impl Recorder {
    pub fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_on: None,
            delay: Duration::from_millis(5),
        }
    }

    #[allow(dead_code)]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[allow(dead_code)]
    pub fn failing_on(mut self, capability: Capability) -> Self {
        self.fail_on = Some(capability);
        self
    }

    async fn record(
        &self,
        capability: Capability,
        token: &CancellationToken,
    ) -> Result<(), BoxError> {
        let phase = capability.phase();
        self.log.push(format!("{}:{}-begin", self.name, phase));
        if token.is_cancelled() {
            self.log.push(format!("{}:{}-canceled", self.name, phase));
        }
        tokio::time::sleep(self.delay).await;
        if self.fail_on == Some(capability) {
            return Err(format!("{} failed in {}", self.name, phase).into());
        }
        self.log.push(format!("{}:{}-end", self.name, phase));
        Ok(())
    }
}

#[async_trait]
impl Participant for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    async fn pre_start(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::PreStart, token).await
    }

    async fn start(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::Start, token).await
    }

    async fn post_start(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::PostStart, token).await
    }

    async fn pre_stop(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::PreStop, token).await
    }

    async fn stop(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::Stop, token).await
    }

    async fn post_stop(&self, token: &CancellationToken) -> Result<(), BoxError> {
        self.record(Capability::PostStop, token).await
    }
}

/// Which application hook should fail.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[allow(dead_code)]
pub enum FailAt {
    #[default]
    Nowhere,
    Start,
    Run,
    Stop,
}

/// Application logging `app:start`, `app:run`, `app:stop`.
pub struct RecordingApp {
    log: EventLog,
    fail_at: FailAt,
}

impl RecordingApp {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_at: FailAt::Nowhere,
        }
    }

    #[allow(dead_code)]
    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = fail_at;
        self
    }

    fn hook(&self, name: &str, at: FailAt) -> Result<(), BoxError> {
        self.log.push(format!("app:{name}"));
        if self.fail_at == at {
            return Err(format!("app {name} failed").into());
        }
        Ok(())
    }
}

#[async_trait]
impl Application for RecordingApp {
    async fn start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        self.hook("start", FailAt::Start)
    }

    async fn run(&self) -> Result<(), BoxError> {
        self.hook("run", FailAt::Run)
    }

    async fn stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        self.hook("stop", FailAt::Stop)
    }
}

/// Log every gate firing as `gate:<name>`.
pub fn observe_gates(host: &Host, log: &EventLog) {
    for gate in [
        host.application_started(),
        host.application_stopping(),
        host.application_stopped(),
    ] {
        let log = log.clone();
        let _registration =
            gate.on_signaled(move |signal| log.push(format!("gate:{}", signal.gate)));
    }
}

/// Build a host with the given registrations, observing its gates.
pub fn host_with<F>(log: &EventLog, app: RecordingApp, register: F) -> (Host, Arc<AtomicUsize>)
where
    F: FnOnce(&mut RegistryBuilder),
{
    let disposals = Arc::new(AtomicUsize::new(0));
    let mut builder = RegistryBuilder::new();
    register(&mut builder);
    let d = disposals.clone();
    builder.add_disposer("counter", move || {
        d.fetch_add(1, Ordering::SeqCst);
    });

    let host = Host::new(Arc::new(app), Arc::new(builder.build()));
    observe_gates(&host, log);
    (host, disposals)
}
