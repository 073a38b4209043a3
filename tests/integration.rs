//! Integration tests for Saisei
//!
//! End-to-end runs of complete workflows loaded from JSON.
//!
mod common;
use common::*;
use saisei::prelude::*;
use serde_json::json;

const MAINTENANCE_JSON: &str = r#"{
    "nodes": [
        { "id": "sensor", "type": "data_input", "label": "Sensor data" },
        { "id": "check", "type": "condition", "label": "Overheating?",
          "config": { "condition": "temperature > 90" } },
        { "id": "cool", "type": "action-execution", "label": "Cooling",
          "config": { "assign": { "cooling": true } } },
        { "id": "notify", "type": "notification", "label": "Tell operator",
          "config": { "channel": "sms" } },
        { "id": "stats", "type": "data-aggregation", "label": "Max reading",
          "config": { "function": "max", "field": "readings" } },
        { "id": "report", "type": "data-output", "label": "Report" }
    ],
    "edges": [
        { "id": "e1", "source": "sensor", "target": "check" },
        { "id": "e2", "source": "check", "target": "cool", "sourceHandle": "true" },
        { "id": "e3", "source": "check", "target": "stats", "sourceHandle": "false" },
        { "id": "e4", "source": "cool", "target": "notify" },
        { "id": "e5", "source": "notify", "target": "report" },
        { "id": "e6", "source": "stats", "target": "report" }
    ]
}"#;

fn load() -> WorkflowDefinition {
    let workflow: WorkflowDefinition = serde_json::from_str(MAINTENANCE_JSON).unwrap();
    workflow.into_workflow().unwrap()
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_wire_format_aliases() {
        let workflow = load();
        assert_eq!(workflow.nodes[0].kind, NodeKind::DataInput);
        assert_eq!(workflow.nodes[1].kind, NodeKind::Decision);
        assert_eq!(workflow.nodes[5].kind, NodeKind::Output);
        assert_eq!(workflow.edges[1].source_handle, Some(BranchHandle::True));
        assert_eq!(workflow.edges[0].source_handle, None);
    }

    #[tokio::test]
    async fn test_hot_run_cools_and_notifies() {
        let mut sim = create_simulator(load(), json!({ "temperature": 97, "readings": [90, 97] }));
        let state = run_to_completion(&mut sim).await;

        assert_eq!(sim.path(), ["sensor", "check", "cool", "notify", "report"]);
        assert!(state.steps.iter().all(|s| s.status == StepStatus::Success));

        let notify = &state.steps[3];
        assert_eq!(notify.output.as_ref().unwrap()["channel"], json!("sms"));
        assert_eq!(notify.output.as_ref().unwrap()["status"], json!("sent"));

        let report = state.steps[4].output.as_ref().unwrap();
        assert_eq!(report["cooling"], json!(true));
        assert_eq!(state.global_data["cooling"], json!(true));
        assert_eq!(sim.phase(), SimulationPhase::Completed);
    }

    #[tokio::test]
    async fn test_cool_run_aggregates() {
        let mut sim = create_simulator(load(), json!({ "temperature": 60, "readings": [55, 61, 58] }));
        let state = run_to_completion(&mut sim).await;

        assert_eq!(sim.path(), ["sensor", "check", "stats", "report"]);
        assert_eq!(state.global_data["max_readings"], json!(61.0));
        assert_eq!(state.steps[1].reason.as_deref(), Some("$temperature (was 60) > 90"));
    }

    #[tokio::test]
    async fn test_aggregation_failure_does_not_abort_run() {
        let mut sim = create_simulator(load(), json!({ "temperature": 60, "readings": "n/a" }));
        let state = run_to_completion(&mut sim).await;

        assert_eq!(state.steps[2].node_id, "stats");
        assert_eq!(state.steps[2].status, StepStatus::Error);
        assert_eq!(state.steps[3].node_id, "report");
        assert!(!state.is_running);
    }

    #[tokio::test]
    async fn test_fan_out_follows_first_edge() {
        let workflow = WorkflowDefinition {
            nodes: vec![
                WorkflowNode::new("start", NodeKind::Input, "Start"),
                WorkflowNode::new("left", NodeKind::Output, "Left"),
                WorkflowNode::new("right", NodeKind::Output, "Right"),
            ],
            edges: vec![
                WorkflowEdge::new("e1", "start", "left"),
                WorkflowEdge::new("e2", "start", "right"),
            ],
        };
        let mut sim = create_simulator(workflow, json!({}));
        run_to_completion(&mut sim).await;
        assert_eq!(sim.path(), ["start", "left"]);
    }

    #[tokio::test]
    async fn test_unreached_branch_without_matching_edge_ends_run() {
        let workflow = WorkflowDefinition {
            nodes: vec![
                WorkflowNode::new("d", NodeKind::Decision, "Hot?")
                    .with_config("condition", "temperature > 90"),
                WorkflowNode::new("alarm", NodeKind::Notification, "Alarm"),
            ],
            edges: vec![WorkflowEdge::new("e1", "d", "alarm").with_handle(BranchHandle::True)],
        };
        let mut sim = create_simulator(workflow, json!({ "temperature": 20 }));
        let state = run_to_completion(&mut sim).await;

        assert_eq!(state.steps.len(), 1);
        assert!(!state.is_running);
    }

    #[tokio::test]
    async fn test_cycle_enters_at_input_node() {
        let workflow = WorkflowDefinition {
            nodes: vec![
                WorkflowNode::new("act", NodeKind::Action, "Act"),
                WorkflowNode::new("in", NodeKind::Input, "In"),
            ],
            edges: vec![
                WorkflowEdge::new("e1", "in", "act"),
                WorkflowEdge::new("e2", "act", "in"),
            ],
        };
        let mut sim = create_simulator(workflow, json!({}));
        sim.start().await;
        sim.step_forward().await;
        let state = sim.step_forward().await;

        assert_eq!(sim.path(), ["in", "act", "in"]);
        assert!(state.is_running);
    }

    #[tokio::test]
    async fn test_llm_judgment_without_rule_is_skipped() {
        let workflow = WorkflowDefinition {
            nodes: vec![
                WorkflowNode::new("judge", NodeKind::LlmJudgment, "Ask model")
                    .with_config("prompt", "Is the machine healthy?"),
                WorkflowNode::new("done", NodeKind::Output, "Done"),
            ],
            edges: vec![WorkflowEdge::new("e1", "judge", "done")],
        };
        let mut sim = create_simulator(workflow, json!({}));
        let state = run_to_completion(&mut sim).await;

        assert_eq!(state.steps[0].status, StepStatus::Skipped);
        assert_eq!(state.steps[1].node_id, "done");
    }
}
