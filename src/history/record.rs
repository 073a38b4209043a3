use crate::simulator::{SimulationState, SimulationStep, WorkflowSimulator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// How a recorded run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Error,
    /// The run was saved before it reached a terminal node.
    Partial,
}

impl RunOutcome {
    pub fn of(state: &SimulationState) -> Self {
        if state.steps.iter().any(SimulationStep::is_error) {
            RunOutcome::Error
        } else if !state.is_running && !state.steps.is_empty() {
            RunOutcome::Success
        } else {
            RunOutcome::Partial
        }
    }
}

/// A saved simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRecord {
    pub id: String,
    pub workflow_id: String,
    pub workflow_name: String,
    /// Unix time in milliseconds.
    pub timestamp: u64,
    pub initial_data: Map<String, Value>,
    pub steps: Vec<SimulationStep>,
    pub final_state: SimulationState,
    pub duration_ms: u64,
    pub status: RunOutcome,
}

impl SimulationRecord {
    pub fn from_state(
        workflow_id: impl Into<String>,
        workflow_name: impl Into<String>,
        initial_data: Map<String, Value>,
        state: SimulationState,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            workflow_name: workflow_name.into(),
            timestamp: unix_millis(),
            initial_data,
            steps: state.steps.clone(),
            duration_ms: state.steps.iter().map(|s| s.execution_time_ms).sum(),
            status: RunOutcome::of(&state),
            final_state: state,
        }
    }

    /// Records the current run of a simulator.
    pub fn capture(simulator: &WorkflowSimulator) -> Self {
        Self::from_state(
            simulator.workflow_id(),
            simulator.workflow_name(),
            simulator.initial_data().clone(),
            simulator.state(),
        )
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
