use super::state::StepStatus;
use crate::ast::VariablePath;
use crate::error::NodeExecutionError;
use crate::evaluator::{ConditionEvaluator, RuleEngine};
use crate::workflow::{NodeKind, Transition, WorkflowNode};
use async_trait::async_trait;
use serde_json::{Map, Value, json};

const DEFAULT_CHANNEL: &str = "email";
const DEFAULT_AGGREGATION: &str = "avg";

/// What an action-like node asks the host to perform.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub node: &'a WorkflowNode,
    pub global_data: &'a Map<String, Value>,
}

/// The result of a performed action: a display output and the global-data
/// updates to commit once the step completes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionOutcome {
    pub output: Value,
    pub updates: Map<String, Value>,
}

/// Performs the side effects of action-like nodes.
///
/// The simulator never touches the outside world itself; hosts that want real
/// notifications or writes plug in their own handler.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn perform(&self, request: ActionRequest<'_>) -> Result<ActionOutcome, NodeExecutionError>;
}

/// The default handler. Every action is simulated in-process.
#[derive(Debug, Default)]
pub struct SimulatedActions {
    rules: RuleEngine,
}

impl SimulatedActions {
    pub fn new() -> Self {
        Self::default()
    }

    fn act(&self, request: ActionRequest<'_>) -> Result<ActionOutcome, NodeExecutionError> {
        let node = request.node;
        let mut scratch = request.global_data.clone();
        let mut updates = Map::new();

        if let Some(assign) = node.config.get("assign") {
            let assign = object_config(node, "assign", assign)?;
            for (field, value) in assign {
                scratch.insert(field.clone(), value.clone());
                updates.insert(field.clone(), value.clone());
            }
        }

        if let Some(compute) = node.config.get("compute") {
            let compute = object_config(node, "compute", compute)?;
            for (field, expression) in compute {
                let expression =
                    expression
                        .as_str()
                        .ok_or_else(|| NodeExecutionError::InvalidConfig {
                            node_id: node.id.clone(),
                            key: format!("compute.{}", field),
                            message: "expected an expression string".to_string(),
                        })?;
                let value = self
                    .rules
                    .compute(expression, &scratch)
                    .map_err(|source| NodeExecutionError::Compute {
                        node_id: node.id.clone(),
                        field: field.clone(),
                        source,
                    })?
                    .to_json();
                scratch.insert(field.clone(), value.clone());
                updates.insert(field.clone(), value);
            }
        }

        let action = node.config_str("action").unwrap_or(node.label.as_str());
        Ok(ActionOutcome {
            output: json!({
                "action": action,
                "status": "simulated",
                "assigned": updates.clone(),
            }),
            updates,
        })
    }

    fn notify(&self, request: ActionRequest<'_>) -> ActionOutcome {
        let node = request.node;
        let mut channels: Vec<String> = match node.config.get("channels") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => node
                .config_str("channel")
                .map(|c| vec![c.to_string()])
                .unwrap_or_default(),
        };
        if channels.is_empty() {
            channels.push(DEFAULT_CHANNEL.to_string());
        }
        let message = node.config_str("message").unwrap_or(node.label.as_str());
        log::info!(
            "Simulated notification from '{}' via {}",
            node.id,
            channels.join(", ")
        );

        ActionOutcome {
            output: json!({
                "channel": channels[0],
                "channels": channels,
                "message": message,
                "status": "sent",
            }),
            updates: Map::new(),
        }
    }

    fn aggregate(&self, request: ActionRequest<'_>) -> Result<ActionOutcome, NodeExecutionError> {
        let node = request.node;
        let function = node
            .config_str("function")
            .or_else(|| node.config_str("aggregateFunction"))
            .unwrap_or(DEFAULT_AGGREGATION);
        let field = node
            .config_str("field")
            .or_else(|| node.config_str("targetField"))
            .ok_or_else(|| NodeExecutionError::MissingConfig {
                node_id: node.id.clone(),
                key: "field".to_string(),
            })?;
        let output_field = node
            .config_str("outputField")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_{}", function, field));

        let raw = VariablePath::parse(field)
            .resolve(request.global_data)
            .ok_or_else(|| NodeExecutionError::MissingField {
                node_id: node.id.clone(),
                field: field.to_string(),
            })?;
        let values = numbers_of(raw).ok_or_else(|| NodeExecutionError::ActionFailed {
            node_id: node.id.clone(),
            message: format!("field '{}' must hold a number or an array of numbers", field),
        })?;
        if values.is_empty() {
            return Err(NodeExecutionError::ActionFailed {
                node_id: node.id.clone(),
                message: format!("field '{}' has no values to aggregate", field),
            });
        }

        let count = values.len() as f64;
        let result = match function {
            "sum" => values.iter().sum(),
            "avg" => values.iter().sum::<f64>() / count,
            "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
            "max" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            "count" => count,
            other => {
                return Err(NodeExecutionError::InvalidConfig {
                    node_id: node.id.clone(),
                    key: "function".to_string(),
                    message: format!("unsupported aggregation '{}'", other),
                });
            }
        };
        if !result.is_finite() {
            return Err(NodeExecutionError::ActionFailed {
                node_id: node.id.clone(),
                message: format!("{} of '{}' is not a finite number", function, field),
            });
        }

        let mut updates = Map::new();
        updates.insert(output_field.clone(), json!(result));
        Ok(ActionOutcome {
            output: json!({
                "function": function,
                "field": field,
                "outputField": output_field,
                "result": result,
                "count": values.len(),
            }),
            updates,
        })
    }
}

#[async_trait]
impl ActionHandler for SimulatedActions {
    async fn perform(&self, request: ActionRequest<'_>) -> Result<ActionOutcome, NodeExecutionError> {
        match request.node.kind {
            NodeKind::Action | NodeKind::ActionExecution => self.act(request),
            NodeKind::Notification => Ok(self.notify(request)),
            NodeKind::DataAggregation => self.aggregate(request),
            other => Err(NodeExecutionError::ActionFailed {
                node_id: request.node.id.clone(),
                message: format!("'{}' nodes are not actions", other),
            }),
        }
    }
}

fn object_config<'a>(
    node: &WorkflowNode,
    key: &str,
    value: &'a Value,
) -> Result<&'a Map<String, Value>, NodeExecutionError> {
    value
        .as_object()
        .ok_or_else(|| NodeExecutionError::InvalidConfig {
            node_id: node.id.clone(),
            key: key.to_string(),
            message: "expected an object".to_string(),
        })
}

fn numbers_of(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Number(n) => n.as_f64().map(|n| vec![n]),
        Value::Array(items) => items.iter().map(Value::as_f64).collect(),
        _ => None,
    }
}

/// Everything a node execution produced, before it is committed to the run.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeRun {
    pub status: StepStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub reason: Option<String>,
    pub updates: Map<String, Value>,
    pub transition: Transition,
}

impl NodeRun {
    fn success(output: Value, transition: Transition) -> Self {
        Self {
            status: StepStatus::Success,
            output: Some(output),
            error: None,
            reason: None,
            updates: Map::new(),
            transition,
        }
    }

    fn failure(err: NodeExecutionError, transition: Transition) -> Self {
        Self {
            status: StepStatus::Error,
            output: None,
            error: Some(err.to_string()),
            reason: None,
            updates: Map::new(),
            transition,
        }
    }
}

/// Dispatches a node to the behaviour of its kind.
pub(crate) struct NodeExecutor<'a> {
    evaluator: &'a dyn ConditionEvaluator,
    actions: &'a dyn ActionHandler,
}

impl<'a> NodeExecutor<'a> {
    pub fn new(evaluator: &'a dyn ConditionEvaluator, actions: &'a dyn ActionHandler) -> Self {
        Self { evaluator, actions }
    }

    /// Runs one node. Never mutates `global_data`; updates are returned on the run.
    pub async fn execute(&self, node: &WorkflowNode, global_data: &Map<String, Value>) -> NodeRun {
        match node.kind {
            NodeKind::Input | NodeKind::DataInput => self.capture_input(node, global_data),
            NodeKind::Decision | NodeKind::RuleJudgment => self.decide(node, global_data),
            NodeKind::LlmJudgment => match node.condition() {
                Some(_) => self.decide(node, global_data),
                None => Self::skip_judgment(node),
            },
            NodeKind::Action
            | NodeKind::ActionExecution
            | NodeKind::Notification
            | NodeKind::DataAggregation => self.perform(node, global_data).await,
            NodeKind::Output => {
                NodeRun::success(Value::Object(global_data.clone()), Transition::Unconditional)
            }
        }
    }

    fn capture_input(&self, node: &WorkflowNode, global_data: &Map<String, Value>) -> NodeRun {
        let Some(fields) = node.config.get("fields").and_then(Value::as_array) else {
            return NodeRun::success(Value::Object(global_data.clone()), Transition::Unconditional);
        };

        let mut captured = Map::new();
        for field in fields.iter().filter_map(Value::as_str) {
            match global_data.get(field) {
                Some(value) => {
                    captured.insert(field.to_string(), value.clone());
                }
                None => {
                    let err = NodeExecutionError::MissingField {
                        node_id: node.id.clone(),
                        field: field.to_string(),
                    };
                    return NodeRun::failure(err, Transition::Unconditional);
                }
            }
        }
        NodeRun::success(Value::Object(captured), Transition::Unconditional)
    }

    fn decide(&self, node: &WorkflowNode, global_data: &Map<String, Value>) -> NodeRun {
        let Some(condition) = node.condition() else {
            let err = NodeExecutionError::MissingConfig {
                node_id: node.id.clone(),
                key: "condition".to_string(),
            };
            return NodeRun::failure(err, Transition::Failed);
        };

        match self.evaluator.decide(condition, global_data) {
            Ok(decision) => {
                log::debug!(
                    "Decision '{}' took the {} branch",
                    node.id,
                    decision.result
                );
                NodeRun {
                    reason: decision.reason,
                    ..NodeRun::success(Value::Bool(decision.result), Transition::Branch(decision.result))
                }
            }
            Err(source) => {
                let err = NodeExecutionError::Condition {
                    node_id: node.id.clone(),
                    source,
                };
                log::warn!("{}", err);
                NodeRun::failure(err, Transition::Failed)
            }
        }
    }

    fn skip_judgment(node: &WorkflowNode) -> NodeRun {
        let output = json!({
            "prompt": node.config.get("prompt").cloned().unwrap_or(Value::Null),
            "model": node.config.get("model").cloned().unwrap_or(Value::Null),
            "simulated": false,
        });
        NodeRun {
            status: StepStatus::Skipped,
            ..NodeRun::success(output, Transition::Unconditional)
        }
    }

    async fn perform(&self, node: &WorkflowNode, global_data: &Map<String, Value>) -> NodeRun {
        let request = ActionRequest { node, global_data };
        match self.actions.perform(request).await {
            Ok(outcome) => NodeRun {
                updates: outcome.updates,
                ..NodeRun::success(outcome.output, Transition::Unconditional)
            },
            Err(err) => {
                log::warn!("{}", err);
                NodeRun::failure(err, Transition::Unconditional)
            }
        }
    }
}
