//! Run-phase entry point invocation.

use tokio_util::sync::CancellationToken;

use crate::error::LifecycleError;
use crate::lifecycle::participant::Application;

/// Runs the application's entry point once startup has completed.
pub struct EntryPointRunner<'a> {
    app: &'a dyn Application,
}

impl<'a> EntryPointRunner<'a> {
    pub fn new(app: &'a dyn Application) -> Self {
        Self { app }
    }

    /// Invoke the entry point unless `abort_start` was already canceled.
    pub async fn run(&self, abort_start: &CancellationToken) -> Result<(), LifecycleError> {
        if abort_start.is_cancelled() {
            return Err(LifecycleError::StartAborted);
        }

        tracing::trace!("run entry point");
        self.app.run().await.map_err(LifecycleError::EntryPoint)
    }
}
