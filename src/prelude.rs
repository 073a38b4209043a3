//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build a workflow, simulate it and keep its history.
//!
//! # Example
//!
//! ```rust,no_run
//! use saisei::prelude::*;
//!
//! # async fn run_example() -> Result<(), Box<dyn std::error::Error>> {
//! let raw = std::fs::read_to_string("path/to/workflow.json")?;
//! let workflow: WorkflowDefinition = serde_json::from_str(&raw)?;
//! let data = InitialData::from_file("path/to/data.json")?;
//!
//! let mut simulator = WorkflowSimulator::new(workflow.nodes, workflow.edges, data.into_inner());
//! let state = simulator.start().await;
//! println!("First step: {:?}", state.current_step());
//! # Ok(())
//! # }
//! ```

// Graph model
pub use crate::workflow::{
    BranchHandle, IntoWorkflow, NodeKind, WorkflowDefinition, WorkflowEdge, WorkflowGraph,
    WorkflowNode,
};

// Simulation
pub use crate::simulator::{
    ActionHandler, Autoplay, AutoplayHandle, Clock, FrozenClock, SharedSimulator,
    SimulatedActions, SimulationPhase, SimulationState, SimulationStep, StepStatus,
    WorkflowSimulator,
};

// Conditions
pub use crate::evaluator::{ConditionEvaluator, Decision, RuleEngine};

// History
pub use crate::history::{
    HistoryStore, JsonFileHistoryStore, MemoryHistoryStore, RunOutcome, SimulationRecord,
};

// Data and configuration
pub use crate::config::SimulatorConfig;
pub use crate::data::InitialData;

// Error types
pub use crate::error::{ConditionError, GraphError, HistoryError, NodeExecutionError};

// Trace formatting
pub use crate::trace::TraceFormatter;
