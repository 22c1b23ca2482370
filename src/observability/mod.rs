//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle events:
//!     → logging.rs (structured log events per phase, participant, gate)
//!     → metrics.rs (phase durations, participant failures, gate firings)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (phase, participant, gate) on every event
//! - Faults are logged at error level with `fatal = true`
//! - Recording without an installed exporter is a no-op

pub mod logging;
pub mod metrics;
