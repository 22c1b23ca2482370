//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (host.rs):
//!     pre_start → start → Application::start → post_start
//!     → fire ApplicationStarted → entry.rs (Application::run)
//!
//! Shutdown (host.rs):
//!     fire ApplicationStopping → pre_stop → stop → Application::stop
//!     → post_stop → fire ApplicationStopped (always)
//!
//! Each participant phase (invoker.rs):
//!     registry.resolve_all(capability) → one participant at a time
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → caller stops the host
//! ```
//!
//! # Design Decisions
//! - Ordered startup and shutdown; phases are never skipped or reordered
//! - Fail fast: the first failing participant ends the sequence
//! - Gates (gate.rs) are the only state shared with observers

pub mod entry;
pub mod gate;
pub mod host;
pub mod invoker;
pub mod participant;
pub mod phase;
pub mod signals;

pub use gate::{GateKind, GateRegistration, GateSignal, LifecycleGate};
pub use host::{Host, LifecycleState, StartTask};
pub use participant::{Application, Participant};
pub use phase::{Capability, Phase};
