use crate::error::UnknownNodeKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// The semantic type of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeKind {
    Input,
    DataInput,
    Decision,
    RuleJudgment,
    LlmJudgment,
    Action,
    ActionExecution,
    Notification,
    DataAggregation,
    Output,
}

impl NodeKind {
    pub const ALL: [NodeKind; 10] = [
        NodeKind::Input,
        NodeKind::DataInput,
        NodeKind::Decision,
        NodeKind::RuleJudgment,
        NodeKind::LlmJudgment,
        NodeKind::Action,
        NodeKind::ActionExecution,
        NodeKind::Notification,
        NodeKind::DataAggregation,
        NodeKind::Output,
    ];

    /// The canonical (kebab-case) tag.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::DataInput => "data-input",
            NodeKind::Decision => "decision",
            NodeKind::RuleJudgment => "rule-judgment",
            NodeKind::LlmJudgment => "llm-judgment",
            NodeKind::Action => "action",
            NodeKind::ActionExecution => "action-execution",
            NodeKind::Notification => "notification",
            NodeKind::DataAggregation => "data-aggregation",
            NodeKind::Output => "output",
        }
    }

    pub fn is_input_like(self) -> bool {
        matches!(self, NodeKind::Input | NodeKind::DataInput)
    }

    /// Kinds whose outgoing edges may be tagged with a branch handle.
    pub fn is_decision_like(self) -> bool {
        matches!(
            self,
            NodeKind::Decision | NodeKind::RuleJudgment | NodeKind::LlmJudgment
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, NodeKind::Output)
    }
}

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    /// Accepts kebab-case, snake_case and the legacy aliases `condition` and `data-output`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let kind = match normalized.as_str() {
            "input" => NodeKind::Input,
            "data-input" => NodeKind::DataInput,
            "decision" | "condition" => NodeKind::Decision,
            "rule-judgment" => NodeKind::RuleJudgment,
            "llm-judgment" => NodeKind::LlmJudgment,
            "action" => NodeKind::Action,
            "action-execution" => NodeKind::ActionExecution,
            "notification" => NodeKind::Notification,
            "data-aggregation" => NodeKind::DataAggregation,
            "output" | "data-output" => NodeKind::Output,
            _ => return Err(UnknownNodeKind(s.to_string())),
        };
        Ok(kind)
    }
}

impl TryFrom<String> for NodeKind {
    type Error = UnknownNodeKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex of the workflow graph. Nodes are never mutated by the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    /// Type-specific configuration (condition, action descriptor, channel, ...).
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl WorkflowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    /// The condition of a decision-like node: `condition`, falling back to `rule`.
    pub fn condition(&self) -> Option<&str> {
        self.config_str("condition").or_else(|| self.config_str("rule"))
    }
}

/// Which branch of a decision an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BranchHandle {
    #[serde(rename = "true")]
    True,
    #[serde(rename = "false")]
    False,
}

impl BranchHandle {
    pub fn matches(self, outcome: bool) -> bool {
        matches!(
            (self, outcome),
            (BranchHandle::True, true) | (BranchHandle::False, false)
        )
    }

    /// Reads a handle tag; anything other than `"true"`/`"false"` is `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "true" => Some(BranchHandle::True),
            "false" => Some(BranchHandle::False),
            _ => None,
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<BranchHandle>,
}

impl WorkflowEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
        }
    }

    pub fn with_handle(mut self, handle: BranchHandle) -> Self {
        self.source_handle = Some(handle);
        self
    }
}

/// The complete, canonical definition of a workflow, ready for simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub nodes: Vec<WorkflowNode>,
    pub edges: Vec<WorkflowEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_accept_aliases_and_snake_case() {
        assert_eq!("condition".parse::<NodeKind>(), Ok(NodeKind::Decision));
        assert_eq!("data-output".parse::<NodeKind>(), Ok(NodeKind::Output));
        assert_eq!("rule_judgment".parse::<NodeKind>(), Ok(NodeKind::RuleJudgment));
        assert_eq!(
            "teleport".parse::<NodeKind>(),
            Err(UnknownNodeKind("teleport".to_string()))
        );
    }

    #[test]
    fn every_kind_round_trips_its_tag() {
        for kind in NodeKind::ALL {
            assert_eq!(kind.as_str().parse::<NodeKind>(), Ok(kind));
        }
    }

    #[test]
    fn node_deserializes_from_wire_format() {
        let node: WorkflowNode = serde_json::from_value(serde_json::json!({
            "id": "n2",
            "type": "decision",
            "label": "Temperature check",
            "config": { "rule": "temperature > 80" }
        }))
        .unwrap();
        assert_eq!(node.kind, NodeKind::Decision);
        assert_eq!(node.condition(), Some("temperature > 80"));
    }

    #[test]
    fn edge_handle_uses_string_tags() {
        let edge: WorkflowEdge = serde_json::from_value(serde_json::json!({
            "id": "e1", "source": "a", "target": "b", "sourceHandle": "false"
        }))
        .unwrap();
        assert_eq!(edge.source_handle, Some(BranchHandle::False));
    }
}
