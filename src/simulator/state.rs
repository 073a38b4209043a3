use crate::workflow::NodeKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Execution status of a recorded step.
///
/// Recorded steps are always `Success`, `Error` or `Skipped`; `Pending` and `Running`
/// exist for hosts that render placeholder rows for steps not yet taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Error,
    Skipped,
}

/// One recorded execution of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStep {
    pub node_id: String,
    pub node_name: String,
    /// `None` for steps that report a graph-level failure rather than a node.
    pub node_type: Option<NodeKind>,
    pub status: StepStatus,
    /// Global data at the moment the node was entered.
    pub input: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Explanation of a decision, e.g. `$temperature (was 95) > 90`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub execution_time_ms: u64,
}

impl SimulationStep {
    pub fn is_error(&self) -> bool {
        self.status == StepStatus::Error
    }
}

/// Render-ready snapshot handed back by every simulator operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub is_running: bool,
    pub is_paused: bool,
    /// `-1` before the run starts.
    pub current_step_index: isize,
    pub steps: Vec<SimulationStep>,
    pub global_data: Map<String, Value>,
}

impl SimulationState {
    pub fn idle(global_data: Map<String, Value>) -> Self {
        Self {
            is_running: false,
            is_paused: false,
            current_step_index: -1,
            steps: Vec::new(),
            global_data,
        }
    }

    pub fn current_step(&self) -> Option<&SimulationStep> {
        usize::try_from(self.current_step_index)
            .ok()
            .and_then(|i| self.steps.get(i))
    }
}

/// The lifecycle phase of a simulator, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationPhase {
    Idle,
    Running,
    Paused,
    /// The cursor is behind the frontier; forward steps revisit recorded history.
    Replaying,
    /// The run reached a terminal node; the log stays available for inspection.
    Completed,
}
