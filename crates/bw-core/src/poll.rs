//! Background status refresh.

use std::sync::Arc;
use std::time::Duration;

use bw_client_api::ClientApi;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::workflow::CompletionWorkflow;

/// Periodically refreshes a workflow until stopped or dropped.
pub struct StatusPoller {
    handle: JoinHandle<()>,
}

impl StatusPoller {
    /// Poll every `poll_interval` from the workflow's configuration.
    pub fn spawn<C>(workflow: Arc<CompletionWorkflow<C>>) -> Self
    where
        C: ClientApi + ?Sized + 'static,
    {
        let interval = workflow.config().poll_interval();
        Self::spawn_with_interval(workflow, interval)
    }

    pub fn spawn_with_interval<C>(workflow: Arc<CompletionWorkflow<C>>, period: Duration) -> Self
    where
        C: ClientApi + ?Sized + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if workflow.is_busy() {
                    debug!(milestone_id = %workflow.milestone_id(), "transition in flight, skipping refresh");
                    continue;
                }
                if workflow.polling_suppressed() {
                    debug!(milestone_id = %workflow.milestone_id(), "messages just read, skipping refresh");
                    continue;
                }
                if let Err(e) = workflow.refresh().await {
                    warn!(milestone_id = %workflow.milestone_id(), error = %e, "status refresh failed");
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
