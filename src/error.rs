use thiserror::Error;

/// Structural problems with a workflow graph, detected before a run starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Workflow graph has no nodes")]
    Empty,

    #[error("Node id '{0}' is declared more than once")]
    DuplicateNode(String),

    #[error("Edge '{edge_id}' references node '{missing_node_id}', which does not exist")]
    DanglingEdge {
        edge_id: String,
        missing_node_id: String,
    },

    #[error("No entry node could be determined: every node has an incoming edge and none is an input node")]
    NoEntryNode,
}

/// Errors raised while parsing or evaluating a condition expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Condition is empty")]
    Empty,

    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Variable '{0}' not found in the global data")]
    VariableNotFound(String),

    #[error(
        "Type mismatch during operation '{operation}': expected {expected}, but found '{found}'"
    )]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Operation '{0}' produced a result that is not a finite number")]
    Overflow(String),
}

/// Failures of a single node execution. These never abort a run; they are recorded on the step.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeExecutionError {
    #[error("Node '{node_id}' is missing required configuration '{key}'")]
    MissingConfig { node_id: String, key: String },

    #[error("Node '{node_id}' has invalid configuration '{key}': {message}")]
    InvalidConfig {
        node_id: String,
        key: String,
        message: String,
    },

    #[error("Condition of node '{node_id}' failed: {source}")]
    Condition {
        node_id: String,
        #[source]
        source: ConditionError,
    },

    #[error("Could not compute '{field}' for node '{node_id}': {source}")]
    Compute {
        node_id: String,
        field: String,
        #[source]
        source: ConditionError,
    },

    #[error("Field '{field}' required by node '{node_id}' is not present in the global data")]
    MissingField { node_id: String, field: String },

    #[error("Action of node '{node_id}' failed: {message}")]
    ActionFailed { node_id: String, message: String },
}

/// Errors from a simulation history store.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("A simulation record with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Could not access history file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("History data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while loading configuration or seed data files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur when converting a custom user format into a `WorkflowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum WorkflowConversionError {
    #[error("Node '{node_id}' has an unknown type '{type_name}'")]
    UnknownNodeType { node_id: String, type_name: String },

    #[error("Edge '{edge_id}' has an invalid source handle '{handle}'")]
    InvalidHandle { edge_id: String, handle: String },

    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}

/// A node type tag that does not name any known node kind.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unsupported node type '{0}'")]
pub struct UnknownNodeKind(pub String);
