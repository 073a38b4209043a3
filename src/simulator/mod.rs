//! The step-by-step workflow simulator.
//!
//! A [`WorkflowSimulator`] executes one node per forward step, keeps an append-only
//! log of every step, and lets the host move a cursor back and forth through that
//! log. Moving forward from anywhere but the newest step replays recorded history
//! instead of executing again.

mod autoplay;
mod clock;
mod executor;
mod shared;
mod state;

pub use autoplay::{Autoplay, AutoplayHandle};
pub use clock::{Clock, FrozenClock, MonotonicClock};
pub use executor::{ActionHandler, ActionOutcome, ActionRequest, SimulatedActions};
pub use shared::SharedSimulator;
pub use state::{SimulationPhase, SimulationState, SimulationStep, StepStatus};

use crate::error::GraphError;
use crate::evaluator::{ConditionEvaluator, RuleEngine};
use crate::workflow::{WorkflowDefinition, WorkflowEdge, WorkflowGraph, WorkflowNode};
use executor::NodeExecutor;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Configures a [`WorkflowSimulator`] before construction.
pub struct SimulatorBuilder {
    definition: WorkflowDefinition,
    initial_data: Map<String, Value>,
    workflow_id: Option<String>,
    workflow_name: Option<String>,
    evaluator: Arc<dyn ConditionEvaluator>,
    actions: Arc<dyn ActionHandler>,
    clock: Arc<dyn Clock>,
}

impl SimulatorBuilder {
    pub fn with_condition_evaluator(mut self, evaluator: impl ConditionEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn with_action_handler(mut self, actions: impl ActionHandler + 'static) -> Self {
        self.actions = Arc::new(actions);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_workflow_id(mut self, id: impl Into<String>) -> Self {
        self.workflow_id = Some(id.into());
        self
    }

    pub fn with_workflow_name(mut self, name: impl Into<String>) -> Self {
        self.workflow_name = Some(name.into());
        self
    }

    pub fn build(self) -> WorkflowSimulator {
        let graph = WorkflowGraph::build(self.definition);
        if let Err(err) = &graph {
            log::warn!("Workflow graph is invalid: {}", err);
        }
        let workflow_id = self
            .workflow_id
            .unwrap_or_else(|| format!("wf-{}", uuid::Uuid::new_v4().simple()));

        WorkflowSimulator {
            workflow_name: self.workflow_name.unwrap_or_else(|| workflow_id.clone()),
            workflow_id,
            graph,
            global_data: self.initial_data.clone(),
            initial_data: self.initial_data,
            steps: Vec::new(),
            cursor: None,
            next_node: None,
            is_running: false,
            is_paused: false,
            evaluator: self.evaluator,
            actions: self.actions,
            clock: self.clock,
        }
    }
}

/// Executes a workflow graph one node at a time.
///
/// Every operation returns a fresh [`SimulationState`] snapshot; the simulator never
/// hands out references into its log.
pub struct WorkflowSimulator {
    workflow_id: String,
    workflow_name: String,
    graph: Result<WorkflowGraph, GraphError>,
    initial_data: Map<String, Value>,
    /// Data as of the newest step. Unaffected by cursor movement.
    global_data: Map<String, Value>,
    steps: Vec<SimulationStep>,
    cursor: Option<usize>,
    /// Node executed by the next forward step taken at the frontier.
    next_node: Option<usize>,
    is_running: bool,
    is_paused: bool,
    evaluator: Arc<dyn ConditionEvaluator>,
    actions: Arc<dyn ActionHandler>,
    clock: Arc<dyn Clock>,
}

impl WorkflowSimulator {
    /// Creates a simulator with the built-in rule engine and simulated actions.
    pub fn new(
        nodes: Vec<WorkflowNode>,
        edges: Vec<WorkflowEdge>,
        initial_data: Map<String, Value>,
    ) -> Self {
        Self::builder(WorkflowDefinition { nodes, edges }, initial_data).build()
    }

    pub fn builder(definition: WorkflowDefinition, initial_data: Map<String, Value>) -> SimulatorBuilder {
        SimulatorBuilder {
            definition,
            initial_data,
            workflow_id: None,
            workflow_name: None,
            evaluator: Arc::new(RuleEngine::new()),
            actions: Arc::new(SimulatedActions::new()),
            clock: Arc::new(MonotonicClock::default()),
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    pub fn graph(&self) -> Result<&WorkflowGraph, &GraphError> {
        self.graph.as_ref()
    }

    pub fn initial_data(&self) -> &Map<String, Value> {
        &self.initial_data
    }

    /// Begins a fresh run at the entry node, discarding any previous log.
    pub async fn start(&mut self) -> SimulationState {
        self.clear_run();

        let entry = match self
            .graph
            .as_ref()
            .map_err(GraphError::clone)
            .and_then(|g| g.entry())
        {
            Ok(entry) => entry,
            Err(err) => {
                self.record_graph_error(err);
                return self.state();
            }
        };

        log::info!("Starting simulation of '{}'", self.workflow_name);
        self.is_running = true;
        self.next_node = Some(entry);
        self.execute_next().await;
        self.state()
    }

    /// Moves one step forward: replays a recorded step if the cursor is behind the
    /// frontier, otherwise executes the next node. A no-op before `start` and once
    /// the run has finished.
    pub async fn step_forward(&mut self) -> SimulationState {
        let Some(cursor) = self.cursor else {
            log::debug!("step_forward ignored: simulation has not started");
            return self.state();
        };

        if cursor + 1 < self.steps.len() {
            self.cursor = Some(cursor + 1);
            log::debug!("Replaying step {}", cursor + 1);
            return self.state();
        }

        if self.is_running {
            self.execute_next().await;
        }
        self.state()
    }

    /// Moves the cursor one step back. Never undoes data changes.
    pub fn step_backward(&mut self) -> SimulationState {
        if let Some(cursor) = self.cursor.filter(|&c| c > 0) {
            self.cursor = Some(cursor - 1);
        }
        self.state()
    }

    pub fn pause(&mut self) -> SimulationState {
        if self.is_running {
            self.is_paused = true;
        }
        self.state()
    }

    pub fn resume(&mut self) -> SimulationState {
        if self.is_running {
            self.is_paused = false;
        }
        self.state()
    }

    /// Returns to the pre-start state with the original initial data.
    pub fn reset(&mut self) -> SimulationState {
        self.clear_run();
        log::debug!("Simulation of '{}' reset", self.workflow_name);
        self.state()
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            is_running: self.is_running,
            is_paused: self.is_paused,
            current_step_index: self.cursor.map_or(-1, |c| c as isize),
            steps: self.steps.clone(),
            global_data: self.global_data.clone(),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        match self.cursor {
            None => SimulationPhase::Idle,
            Some(cursor) if cursor + 1 < self.steps.len() => SimulationPhase::Replaying,
            Some(_) if self.is_running && self.is_paused => SimulationPhase::Paused,
            Some(_) if self.is_running => SimulationPhase::Running,
            Some(_) => SimulationPhase::Completed,
        }
    }

    pub fn current_step(&self) -> Option<&SimulationStep> {
        self.cursor.and_then(|c| self.steps.get(c))
    }

    /// Node ids of the log, in execution order.
    pub fn path(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.node_id.as_str()).collect()
    }

    fn clear_run(&mut self) {
        self.steps.clear();
        self.cursor = None;
        self.next_node = None;
        self.global_data = self.initial_data.clone();
        self.is_running = false;
        self.is_paused = false;
    }

    fn record_graph_error(&mut self, err: GraphError) {
        log::warn!("Cannot start '{}': {}", self.workflow_name, err);
        self.steps.push(SimulationStep {
            node_id: String::new(),
            node_name: "Workflow graph".to_string(),
            node_type: None,
            status: StepStatus::Error,
            input: self.global_data.clone(),
            output: None,
            error: Some(err.to_string()),
            reason: None,
            execution_time_ms: 0,
        });
        self.cursor = Some(0);
    }

    /// Executes `next_node` and appends its step. All state changes happen after the
    /// node finishes, so dropping this future mid-execution leaves the run untouched.
    async fn execute_next(&mut self) {
        let (Some(node_idx), Ok(graph)) = (self.next_node, &self.graph) else {
            return;
        };
        let node = graph.node(node_idx);
        let executor = NodeExecutor::new(self.evaluator.as_ref(), self.actions.as_ref());

        let started = self.clock.now();
        let run = executor.execute(node, &self.global_data).await;
        let elapsed = self.clock.now().saturating_sub(started);

        let next = graph.successor(node_idx, run.transition);
        log::debug!(
            "Executed '{}' ({}) -> {:?}",
            node.id,
            node.kind,
            next.map(|i| graph.node(i).id.as_str())
        );

        self.steps.push(SimulationStep {
            node_id: node.id.clone(),
            node_name: node.label.clone(),
            node_type: Some(node.kind),
            status: run.status,
            input: self.global_data.clone(),
            output: run.output,
            error: run.error,
            reason: run.reason,
            execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        self.global_data.extend(run.updates);
        self.cursor = Some(self.steps.len() - 1);
        self.next_node = next;

        if next.is_none() {
            log::info!(
                "Simulation of '{}' finished after {} steps",
                self.workflow_name,
                self.steps.len()
            );
            self.is_running = false;
            self.is_paused = false;
        }
    }
}
