//! One-shot broadcast gates marking lifecycle milestones.
//!
//! # Responsibilities
//! - Fire exactly once, no matter how many callers race on `fire`
//! - Run every callback registered before the gate fired
//! - Run late callbacks eagerly, before `on_signaled` returns
//! - Expose a cancellation token for async observers
//!
//! # Design Decisions
//! - The first-fire check is an atomic compare-and-swap; the payload and the
//!   callback list share one mutex so no subscriber can slip between them
//! - Observers only ever receive child tokens; firing stays with the host

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::observability::metrics;

/// The three gates owned by a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateKind {
    Started,
    Stopping,
    Stopped,
}

impl GateKind {
    /// Public name of the gate.
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::Started => "ApplicationStarted",
            GateKind::Stopping => "ApplicationStopping",
            GateKind::Stopped => "ApplicationStopped",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload handed to every callback of a fired gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateSignal {
    /// Which gate fired.
    pub gate: GateKind,
    /// When it fired.
    pub fired_at: Instant,
}

type Callback = Box<dyn FnOnce(&GateSignal) + Send>;

struct Pending {
    signal: Option<GateSignal>,
    callbacks: Vec<(u64, Callback)>,
    next_id: u64,
}

struct Shared {
    kind: GateKind,
    fired: AtomicBool,
    token: CancellationToken,
    pending: Mutex<Pending>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A one-shot, broadcastable lifecycle signal.
///
/// Cloning yields another handle to the same gate.
#[derive(Clone)]
pub struct LifecycleGate {
    shared: Arc<Shared>,
}

impl LifecycleGate {
    /// Create an unfired gate.
    pub fn new(kind: GateKind) -> Self {
        Self {
            shared: Arc::new(Shared {
                kind,
                fired: AtomicBool::new(false),
                token: CancellationToken::new(),
                pending: Mutex::new(Pending {
                    signal: None,
                    callbacks: Vec::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    /// Which gate this is.
    pub fn kind(&self) -> GateKind {
        self.shared.kind
    }

    /// Whether the gate has fired.
    pub fn is_signaled(&self) -> bool {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// The payload delivered to callbacks, once fired.
    pub fn signal(&self) -> Option<GateSignal> {
        self.shared.lock().signal
    }

    /// A token canceled when the gate fires.
    ///
    /// This is a child token: canceling it does not fire the gate.
    pub fn token(&self) -> CancellationToken {
        self.shared.token.child_token()
    }

    /// Wait until the gate fires. Returns immediately if it already has.
    pub async fn signaled(&self) {
        self.shared.token.cancelled().await;
    }

    /// Register a callback to run when the gate fires.
    ///
    /// If the gate already fired, the callback runs on the calling thread
    /// before this returns and the registration is inert.
    pub fn on_signaled<F>(&self, callback: F) -> GateRegistration
    where
        F: FnOnce(&GateSignal) + Send + 'static,
    {
        let mut pending = self.shared.lock();
        if let Some(signal) = pending.signal {
            drop(pending);
            callback(&signal);
            return GateRegistration { shared: None, id: 0 };
        }

        let id = pending.next_id;
        pending.next_id += 1;
        pending.callbacks.push((id, Box::new(callback)));
        GateRegistration {
            shared: Some(Arc::downgrade(&self.shared)),
            id,
        }
    }

    /// Fire the gate. Only the first call has any effect; it returns `true`.
    pub(crate) fn fire(&self) -> bool {
        if self
            .shared
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let signal = GateSignal {
            gate: self.shared.kind,
            fired_at: Instant::now(),
        };
        let callbacks = {
            let mut pending = self.shared.lock();
            pending.signal = Some(signal);
            std::mem::take(&mut pending.callbacks)
        };

        tracing::trace!(
            gate = %self.shared.kind,
            callbacks = callbacks.len(),
            "cancel gate token"
        );
        metrics::record_gate_fired(self.shared.kind);

        self.shared.token.cancel();
        for (_, callback) in callbacks {
            callback(&signal);
        }
        true
    }
}

impl fmt::Debug for LifecycleGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleGate")
            .field("kind", &self.shared.kind)
            .field("signaled", &self.is_signaled())
            .finish()
    }
}

/// Handle returned by [`LifecycleGate::on_signaled`].
#[derive(Debug)]
pub struct GateRegistration {
    shared: Option<Weak<Shared>>,
    id: u64,
}

impl GateRegistration {
    /// Remove the callback if the gate has not fired yet.
    ///
    /// Returns `true` when a pending callback was removed.
    pub fn unregister(self) -> bool {
        let Some(shared) = self.shared.as_ref().and_then(Weak::upgrade) else {
            return false;
        };
        let mut pending = shared.lock();
        let before = pending.callbacks.len();
        pending.callbacks.retain(|(id, _)| *id != self.id);
        pending.callbacks.len() != before
    }
}

/// Fires a gate when dropped, including during unwinding or when the
/// future holding it is dropped mid-flight.
pub(crate) struct FireOnDrop<'a> {
    gate: &'a LifecycleGate,
}

impl<'a> FireOnDrop<'a> {
    pub(crate) fn new(gate: &'a LifecycleGate) -> Self {
        Self { gate }
    }
}

impl Drop for FireOnDrop<'_> {
    fn drop(&mut self) {
        self.gate.fire();
    }
}
