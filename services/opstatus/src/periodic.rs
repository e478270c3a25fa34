//! Cancellable periodic tasks
//!
//! Each poller runs as a [`PeriodicTask`] owned by the view that started it.
//! The task runs its tick immediately, then once per interval, until it is
//! cancelled, its parent token is cancelled, or the handle is dropped.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Handle to a spawned periodic loop
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawn `tick` every `interval`. The task stops when `parent` is cancelled.
    pub fn spawn<F, Fut>(
        name: impl Into<String>,
        interval: Duration,
        parent: &CancellationToken,
        mut tick: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let cancel = parent.child_token();
        let loop_cancel = cancel.clone();
        let loop_name = name.clone();

        tracing::debug!("Starting periodic task '{}' every {:?}", name, interval);

        let handle = tokio::spawn(async move {
            // Fixed cadence measured from tick start; an overrunning tick
            // pushes the schedule back instead of bursting to catch up
            let mut schedule = tokio::time::interval(interval);
            schedule.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = schedule.tick() => {}
                }

                // A tick already in flight is abandoned on cancellation
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = tick() => {}
                }
            }
            tracing::debug!("Periodic task '{}' cancelled", loop_name);
        });

        Self {
            name,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel the loop and wait for it to wind down
    pub async fn cancel(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Periodic task '{}' ended abnormally: {}", self.name, e);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
