use std::sync::Arc;
use std::time::Duration;

use log::trace;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Periodic background hook, independent of event arrival. Each tick is a
/// no-op today; switch-health polling is meant to hang off it later. The
/// task owns nothing shared, so it never sleeps while holding a lock.
#[derive(Debug)]
pub struct LivenessTask {
    handle: JoinHandle<()>,
    shutdown: Arc<Notify>,
}

impl LivenessTask {
    pub fn spawn(period: Duration) -> Self {
        let shutdown = Arc::new(Notify::new());
        let notified = shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        trace!("liveness tick");
                    }
                    _ = notified.notified() => {
                        trace!("liveness task stopping");
                        break;
                    }
                }
            }
        });
        Self { handle, shutdown }
    }

    /// Cancel the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_a_sleeping_task() {
        let task = LivenessTask::spawn(Duration::from_secs(10));
        // Let the task reach its first sleep, then cancel mid-period.
        tokio::time::advance(Duration::from_secs(3)).await;
        task.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn task_survives_many_periods() {
        let task = LivenessTask::spawn(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(100)).await;
        assert!(!task.handle.is_finished());
        task.shutdown().await;
    }
}
