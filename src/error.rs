//! Error definitions for the lifecycle subsystem.

use thiserror::Error;

use crate::lifecycle::phase::Phase;
use crate::registry::RegistryError;

/// Error type produced by user-supplied participants and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the host's start, stop and dispose operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Start was invoked more than once on the same host.
    #[error("host has already been started")]
    AlreadyStarted,

    /// Start was invoked after a stop had been requested.
    #[error("host has already been stopped")]
    AlreadyStopped,

    /// Start was invoked after the host was disposed.
    #[error("host has already been disposed")]
    AlreadyDisposed,

    /// The start token was canceled before the run phase.
    #[error("start aborted: cancellation requested before the run phase")]
    StartAborted,

    /// A registered participant failed during a phase.
    #[error("participant `{participant}` failed during {phase}: {source}")]
    Participant {
        phase: Phase,
        participant: String,
        #[source]
        source: BoxError,
    },

    /// The application's own start or stop hook failed.
    #[error("application hook failed during {phase}: {source}")]
    Hook {
        phase: Phase,
        #[source]
        source: BoxError,
    },

    /// The run-phase entry point returned an error.
    #[error("entry point failed: {0}")]
    EntryPoint(#[source] BoxError),

    /// The collaborator registry could not resolve participants.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A blocking or background surface was used without a suitable tokio runtime.
    #[error("no suitable tokio runtime is available")]
    NoRuntime,

    /// The background start task panicked or was aborted.
    #[error("background start task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl LifecycleError {
    /// The phase the error was raised in, when it belongs to one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            LifecycleError::Participant { phase, .. } | LifecycleError::Hook { phase, .. } => {
                Some(*phase)
            }
            LifecycleError::EntryPoint(_) => Some(Phase::Run),
            _ => None,
        }
    }
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_error_display() {
        let err = LifecycleError::Participant {
            phase: Phase::Stop,
            participant: "cache".into(),
            source: "disk full".into(),
        };
        assert_eq!(err.to_string(), "participant `cache` failed during stop: disk full");
        assert_eq!(err.phase(), Some(Phase::Stop));
    }

    #[test]
    fn test_entry_point_error_keeps_source() {
        let err = LifecycleError::EntryPoint("boom".into());
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
        assert_eq!(err.phase(), Some(Phase::Run));
        assert_eq!(LifecycleError::AlreadyStarted.phase(), None);
    }
}
