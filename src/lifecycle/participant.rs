//! Participant and application contracts.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::lifecycle::phase::Capability;

/// A unit of work registered with the host and invoked once per matching
/// lifecycle phase.
///
/// Every phase method defaults to a no-op; implement the ones matching the
/// capabilities the participant is registered under.
#[async_trait]
pub trait Participant
where
    Self: Send + Sync + 'static,
{
    /// Name used in logs and error reports.
    fn name(&self) -> &str;

    /// Runs before any hosted service starts.
    async fn pre_start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    /// Starts the participant.
    async fn start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after every hosted service and the application started.
    async fn post_start(&self, _abort_start: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs before any hosted service stops.
    async fn pre_stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    /// Stops the participant.
    async fn stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after every hosted service and the application stopped.
    async fn post_stop(&self, _graceful: &CancellationToken) -> Result<(), BoxError> {
        Ok(())
    }
}

impl Capability {
    /// Call the participant method bound to this capability.
    pub(crate) async fn dispatch(
        &self,
        participant: &dyn Participant,
        token: &CancellationToken,
    ) -> Result<(), BoxError> {
        match self {
            Capability::PreStart => participant.pre_start(token).await,
            Capability::Start => participant.start(token).await,
            Capability::PostStart => participant.post_start(token).await,
            Capability::PreStop => participant.pre_stop(token).await,
            Capability::Stop => participant.stop(token).await,
            Capability::PostStop => participant.post_stop(token).await,
        }
    }
}

/// The application driven by a host: its own start/stop hooks and the
/// run-phase entry point.
#[async_trait]
pub trait Application
where
    Self: Send + Sync + 'static,
{
    /// Called after the start-phase participants, before post-start.
    /// Typically binds listeners.
    async fn start(&self, abort_start: &CancellationToken) -> Result<(), BoxError>;

    /// The entry point, run once startup completed.
    async fn run(&self) -> Result<(), BoxError>;

    /// Called after the stop-phase participants, before post-stop.
    async fn stop(&self, graceful: &CancellationToken) -> Result<(), BoxError>;
}
