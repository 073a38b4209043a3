use super::SharedSimulator;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

/// Host-side timer that keeps stepping a running simulation.
pub struct Autoplay;

impl Autoplay {
    /// Spawns a task that calls `step_forward` every `interval` while the run is
    /// active and not paused. The task ends on its own once the run stops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(simulator: SharedSimulator, interval: Duration) -> AutoplayHandle {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let state = simulator.snapshot();
                if !state.is_running {
                    log::debug!("Autoplay finished");
                    break;
                }
                if state.is_paused {
                    continue;
                }
                simulator.step_forward().await;
            }
        });
        AutoplayHandle { task: Some(task) }
    }
}

/// Controls a spawned autoplay task. Dropping the handle stops the task.
pub struct AutoplayHandle {
    task: Option<JoinHandle<()>>,
}

impl AutoplayHandle {
    pub fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits until the run stops and the task ends by itself. Fails if the task
    /// panicked.
    pub async fn finished(mut self) -> Result<(), JoinError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.inspect_err(|err| log::warn!("Autoplay task failed: {}", err))
    }
}

impl Drop for AutoplayHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
