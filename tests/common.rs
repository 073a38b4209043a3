//! Common test utilities for building workflows and data.
use saisei::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Turns a `json!` object into a data map.
#[allow(dead_code)]
pub fn data(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// `input -> decision -> {action (true), output (false)}`
///
/// Logic: `temperature > 90` -> cooling action
#[allow(dead_code)]
pub fn create_branch_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        nodes: vec![
            WorkflowNode::new("input", NodeKind::Input, "Read sensors"),
            WorkflowNode::new("decision", NodeKind::Decision, "Too hot?")
                .with_config("condition", "temperature > 90"),
            WorkflowNode::new("action", NodeKind::Action, "Start cooling")
                .with_config("action", "cooling_on"),
            WorkflowNode::new("output", NodeKind::Output, "Report"),
        ],
        edges: vec![
            WorkflowEdge::new("e1", "input", "decision"),
            WorkflowEdge::new("e2", "decision", "action").with_handle(BranchHandle::True),
            WorkflowEdge::new("e3", "decision", "output").with_handle(BranchHandle::False),
        ],
    }
}

/// The six-node maintenance workflow used by the end-to-end tests.
///
/// `input -> decision -> (true) action -> notification -> output`
/// `decision -> (false) aggregation -> output`
#[allow(dead_code)]
pub fn create_maintenance_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        nodes: vec![
            WorkflowNode::new("sensor", NodeKind::DataInput, "Sensor data")
                .with_config("fields", json!(["temperature", "vibration", "readings"])),
            WorkflowNode::new("check", NodeKind::RuleJudgment, "Needs maintenance?")
                .with_config("rule", "temperature > 90 && vibration > 20"),
            WorkflowNode::new("schedule", NodeKind::ActionExecution, "Schedule maintenance")
                .with_config("action", "schedule_maintenance")
                .with_config("assign", json!({ "maintenanceScheduled": true }))
                .with_config("compute", json!({ "overheat": "temperature - 90" })),
            WorkflowNode::new("notify", NodeKind::Notification, "Notify technician")
                .with_config("channels", json!(["slack", "email"]))
                .with_config("message", "Machine needs maintenance"),
            WorkflowNode::new("average", NodeKind::DataAggregation, "Average readings")
                .with_config("function", "avg")
                .with_config("field", "readings")
                .with_config("outputField", "averageTemperature"),
            WorkflowNode::new("report", NodeKind::Output, "Report"),
        ],
        edges: vec![
            WorkflowEdge::new("e1", "sensor", "check"),
            WorkflowEdge::new("e2", "check", "schedule").with_handle(BranchHandle::True),
            WorkflowEdge::new("e3", "check", "average").with_handle(BranchHandle::False),
            WorkflowEdge::new("e4", "schedule", "notify"),
            WorkflowEdge::new("e5", "notify", "report"),
            WorkflowEdge::new("e6", "average", "report"),
        ],
    }
}

/// A simulator with a frozen clock, so step logs are reproducible.
#[allow(dead_code)]
pub fn create_simulator(workflow: WorkflowDefinition, initial: Value) -> WorkflowSimulator {
    WorkflowSimulator::builder(workflow, data(initial))
        .with_workflow_id("wf-test")
        .with_workflow_name("Test workflow")
        .with_clock(FrozenClock)
        .build()
}

/// Steps until the run stops, with a safety limit.
#[allow(dead_code)]
pub async fn run_to_completion(simulator: &mut WorkflowSimulator) -> SimulationState {
    let mut state = simulator.start().await;
    for _ in 0..100 {
        if !state.is_running {
            break;
        }
        state = simulator.step_forward().await;
    }
    state
}

/// An action handler that sleeps before completing and counts how often it ran.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct SlowActions {
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl SlowActions {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ActionHandler for SlowActions {
    async fn perform(
        &self,
        request: saisei::simulator::ActionRequest<'_>,
    ) -> Result<saisei::simulator::ActionOutcome, NodeExecutionError> {
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut updates = Map::new();
        updates.insert(format!("{}_done", request.node.id), json!(true));
        Ok(saisei::simulator::ActionOutcome {
            output: json!({ "action": request.node.label }),
            updates,
        })
    }
}

/// `input -> action -> output`
#[allow(dead_code)]
pub fn create_action_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        nodes: vec![
            WorkflowNode::new("input", NodeKind::Input, "Start"),
            WorkflowNode::new("act", NodeKind::Action, "Slow action"),
            WorkflowNode::new("output", NodeKind::Output, "Done"),
        ],
        edges: vec![
            WorkflowEdge::new("e1", "input", "act"),
            WorkflowEdge::new("e2", "act", "output"),
        ],
    }
}
