use super::{SimulationState, WorkflowSimulator};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// A cloneable handle that serialises access to one simulator.
///
/// Every operation publishes its snapshot on a watch channel, so renderers can
/// subscribe instead of polling.
#[derive(Clone)]
pub struct SharedSimulator {
    inner: Arc<Mutex<WorkflowSimulator>>,
    snapshots: Arc<watch::Sender<SimulationState>>,
}

impl SharedSimulator {
    pub fn new(simulator: WorkflowSimulator) -> Self {
        let (snapshots, _) = watch::channel(simulator.state());
        Self {
            inner: Arc::new(Mutex::new(simulator)),
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SimulationState> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> SimulationState {
        self.snapshots.borrow().clone()
    }

    /// Runs `f` with exclusive access to the simulator, then publishes its state.
    pub async fn with<R>(&self, f: impl FnOnce(&mut WorkflowSimulator) -> R) -> R {
        let mut simulator = self.inner.lock().await;
        let result = f(&mut simulator);
        self.publish(simulator.state());
        result
    }

    pub async fn start(&self) -> SimulationState {
        let mut simulator = self.inner.lock().await;
        let state = simulator.start().await;
        self.publish(state)
    }

    /// Steps forward unless another operation holds the simulator, in which case
    /// this call does nothing and returns the latest snapshot.
    pub async fn step_forward(&self) -> SimulationState {
        let Ok(mut simulator) = self.inner.try_lock() else {
            log::warn!("step_forward ignored: the simulator is busy");
            return self.snapshot();
        };
        let state = simulator.step_forward().await;
        self.publish(state)
    }

    pub async fn step_backward(&self) -> SimulationState {
        let state = self.inner.lock().await.step_backward();
        self.publish(state)
    }

    pub async fn pause(&self) -> SimulationState {
        let state = self.inner.lock().await.pause();
        self.publish(state)
    }

    pub async fn resume(&self) -> SimulationState {
        let state = self.inner.lock().await.resume();
        self.publish(state)
    }

    pub async fn reset(&self) -> SimulationState {
        let state = self.inner.lock().await.reset();
        self.publish(state)
    }

    fn publish(&self, state: SimulationState) -> SimulationState {
        self.snapshots.send_replace(state.clone());
        state
    }
}
