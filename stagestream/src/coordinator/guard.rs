//! Cleanup for streams dropped before `Done`.

use crate::cancellation::StopSignal;
use crate::config::DisconnectPolicy;
use tracing::info;
use uuid::Uuid;

/// Lives inside the response stream; dropping it before [`disarm`] means
/// the client went away.
///
/// [`disarm`]: DisconnectGuard::disarm
pub(crate) struct DisconnectGuard {
    job_id: Uuid,
    stop: StopSignal,
    cancel: StopSignal,
    policy: DisconnectPolicy,
    armed: bool,
}

impl DisconnectGuard {
    pub(crate) fn new(
        job_id: Uuid,
        stop: StopSignal,
        cancel: StopSignal,
        policy: DisconnectPolicy,
    ) -> Self {
        Self {
            job_id,
            stop,
            cancel,
            policy,
            armed: true,
        }
    }

    /// Marks the stream as finished normally.
    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        // Heartbeat stops right away under either policy.
        self.stop.stop("client disconnected");

        match self.policy {
            DisconnectPolicy::CompleteInBackground => {
                info!(job_id = %self.job_id, "client disconnected, job continues in background");
            }
            DisconnectPolicy::Abandon => {
                // In-flight stages finish detached; nothing new starts.
                self.cancel.stop("client disconnected");
                info!(job_id = %self.job_id, "client disconnected, job abandoned");
            }
        }
    }
}
