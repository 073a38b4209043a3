use super::definition::WorkflowDefinition;
use crate::error::WorkflowConversionError;

/// A trait for custom graph formats that can be converted into a `WorkflowDefinition`.
///
/// Hosts usually store workflows in whatever shape their node editor produces. By
/// implementing this trait for those structs, the host provides a translation layer
/// into the simulator's canonical graph contract.
///
/// # Example
///
/// ```rust
/// use saisei::prelude::*;
/// use saisei::error::WorkflowConversionError;
///
/// struct EditorNode { id: String, kind: String, title: String }
/// struct EditorGraph { nodes: Vec<EditorNode>, links: Vec<(String, String)> }
///
/// impl IntoWorkflow for EditorGraph {
///     fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError> {
///         let nodes = self
///             .nodes
///             .into_iter()
///             .map(|n| {
///                 let kind = n.kind.parse::<NodeKind>().map_err(|_| WorkflowConversionError::UnknownNodeType {
///                     node_id: n.id.clone(),
///                     type_name: n.kind.clone(),
///                 })?;
///                 Ok(WorkflowNode::new(n.id, kind, n.title))
///             })
///             .collect::<Result<Vec<_>, _>>()?;
///         let edges = self
///             .links
///             .into_iter()
///             .enumerate()
///             .map(|(i, (from, to))| WorkflowEdge::new(format!("e{}", i), from, to))
///             .collect();
///         Ok(WorkflowDefinition { nodes, edges })
///     }
/// }
///
/// let graph = EditorGraph {
///     nodes: vec![EditorNode { id: "a".into(), kind: "input".into(), title: "Read".into() }],
///     links: vec![],
/// };
/// assert_eq!(graph.into_workflow().unwrap().nodes.len(), 1);
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a simulator-ready workflow definition.
    fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError>;
}

impl IntoWorkflow for WorkflowDefinition {
    fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError> {
        Ok(self)
    }
}
