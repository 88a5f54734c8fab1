//! Background refresh loop.
//!
//! Each coordinator gets one tokio task that refreshes, sleeps for the
//! interval the coordinator chose, and repeats until told to stop via
//! a watch channel.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::coordinator::Coordinator;

/// Handle to a running refresh loop.
pub struct ScheduleHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Signal the loop to stop and wait for the task to finish.
    pub async fn stop(self) {
        // Receiver dropping first just means the task already exited
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the refresh loop for a coordinator.
///
/// The first refresh runs immediately so a newly registered target has
/// data as soon as the upstream answers; subsequent polls follow the
/// coordinator's interval.
pub fn spawn_refresh_loop(coordinator: Arc<Coordinator>) -> ScheduleHandle {
    let (shutdown, mut rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        info!(target = %coordinator.key(), "refresh loop started");

        loop {
            tokio::select! {
                outcome = coordinator.refresh() => {
                    if let Err(e) = outcome {
                        debug!(target = %coordinator.key(), error = %e, "scheduled refresh failed");
                    }
                }
                _ = rx.changed() => break,
            }

            let interval = coordinator.current_interval().await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = rx.changed() => break,
            }
        }

        info!(target = %coordinator.key(), "refresh loop stopped");
    });

    ScheduleHandle { shutdown, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::coordinator::coordinator::CoordinatorConfig;
    use crate::coordinator::interval::IntervalPolicy;
    use crate::coordinator::testutil::ScriptedApi;
    use crate::domain::TrackedTarget;

    fn fast_config() -> CoordinatorConfig {
        CoordinatorConfig {
            policy: IntervalPolicy {
                short: Duration::from_millis(10),
                medium: Duration::from_millis(10),
                long: Duration::from_millis(10),
                ..IntervalPolicy::default()
            },
            ..CoordinatorConfig::default()
        }
    }

    fn target() -> TrackedTarget {
        TrackedTarget::stop("12345", None, &["18".to_string()]).unwrap()
    }

    #[tokio::test]
    async fn loop_polls_repeatedly_until_stopped() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let coordinator = Arc::new(Coordinator::new(api.clone(), fast_config(), target()));

        let handle = spawn_refresh_loop(Arc::clone(&coordinator));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop().await;

        let polled = api.calls();
        assert!(polled >= 3, "expected several polls, saw {polled}");

        // No further polls after stop
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.calls(), polled);
    }

    #[tokio::test]
    async fn first_refresh_happens_immediately() {
        let api = Arc::new(ScriptedApi::repeating_ok(vec![]));
        let coordinator = Arc::new(Coordinator::new(api.clone(), fast_config(), target()));

        let handle = spawn_refresh_loop(Arc::clone(&coordinator));
        // Well under the sleep interval; the initial poll is not delayed
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(api.calls() >= 1);

        handle.stop().await;
    }
}
