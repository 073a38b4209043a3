//! # Saisei - Step-by-Step Workflow Simulator
//!
//! **Saisei** executes node-based workflow graphs one node at a time so a host (an editor
//! panel, a CLI, a test) can watch data flow through decisions and actions, pause, step
//! backwards through history, and replay it.
//!
//! ## Core Workflow
//!
//! The simulator is format-agnostic. It operates on a canonical graph model, a
//! [`WorkflowDefinition`](workflow::WorkflowDefinition). The primary workflow is:
//!
//! 1.  **Load Your Graph**: Parse your editor's format into your own Rust structs.
//! 2.  **Convert to Saisei's Model**: Implement [`IntoWorkflow`](workflow::IntoWorkflow) for
//!     those structs.
//! 3.  **Simulate**: Create a [`WorkflowSimulator`](simulator::WorkflowSimulator) with seed
//!     data, call `start`, then drive it with `step_forward` / `step_backward`, or hand it to
//!     [`Autoplay`](simulator::Autoplay) through a [`SharedSimulator`](simulator::SharedSimulator).
//! 4.  **Keep History**: Save finished runs with a [`HistoryStore`](history::HistoryStore).
//!
//! ## Quick Start
//!
//! ```rust
//! use saisei::prelude::*;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let nodes = vec![
//!     WorkflowNode::new("sensor", NodeKind::Input, "Read sensors"),
//!     WorkflowNode::new("hot", NodeKind::Decision, "Too hot?")
//!         .with_config("condition", "temperature > 90"),
//!     WorkflowNode::new("alert", NodeKind::Notification, "Alert operator"),
//!     WorkflowNode::new("done", NodeKind::Output, "Done"),
//! ];
//! let edges = vec![
//!     WorkflowEdge::new("e1", "sensor", "hot"),
//!     WorkflowEdge::new("e2", "hot", "alert").with_handle(BranchHandle::True),
//!     WorkflowEdge::new("e3", "hot", "done").with_handle(BranchHandle::False),
//!     WorkflowEdge::new("e4", "alert", "done"),
//! ];
//! let data = InitialData::sample().into_inner();
//!
//! let mut simulator = WorkflowSimulator::new(nodes, edges, data);
//! simulator.start().await;
//! while simulator.state().is_running {
//!     simulator.step_forward().await;
//! }
//!
//! let state = simulator.state();
//! assert_eq!(state.steps[1].reason.as_deref(), Some("$temperature (was 95) > 90"));
//! assert_eq!(simulator.path(), ["sensor", "hot", "alert", "done"]);
//! # });
//! ```

pub mod ast;
pub mod compiler;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod prelude;
pub mod simulator;
pub mod trace;
pub mod workflow;
