//! Phase fan-out over registered participants.
//!
//! # Responsibilities
//! - Resolve the participants of one capability from the registry
//! - Invoke them one after another, in registration order
//! - Stop at the first failure and report which participant raised it
//!
//! # Design Decisions
//! - Sequential, never concurrent
//! - The caller's token is passed through untouched

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::error::LifecycleError;
use crate::lifecycle::phase::Capability;
use crate::observability::metrics;
use crate::registry::Registry;

/// Invokes one capability across every registered participant.
pub struct ParticipantInvoker<'a> {
    registry: &'a dyn Registry,
}

impl<'a> ParticipantInvoker<'a> {
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    /// Run `capability` on every participant registered for it.
    pub async fn invoke(
        &self,
        capability: Capability,
        token: &CancellationToken,
    ) -> Result<(), LifecycleError> {
        let phase = capability.phase();
        tracing::trace!(phase = %phase, "trigger {}", capability.method_name());

        let participants = self.registry.resolve_all(capability)?;
        let started = Instant::now();

        for participant in participants {
            let name = participant.name();
            tracing::debug!(participant = %name, phase = %phase, "Participant entered");

            if let Err(source) = capability.dispatch(participant.as_ref(), token).await {
                metrics::record_participant_failure(phase);
                tracing::warn!(
                    participant = %name,
                    phase = %phase,
                    error = %source,
                    "Participant failed, skipping the rest of the phase"
                );
                return Err(LifecycleError::Participant {
                    phase,
                    participant: name.to_string(),
                    source,
                });
            }

            tracing::debug!(participant = %name, phase = %phase, "Participant completed");
        }

        metrics::record_phase_duration(phase, started.elapsed());
        Ok(())
    }
}
