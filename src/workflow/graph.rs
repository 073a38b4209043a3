use super::definition::{WorkflowDefinition, WorkflowEdge, WorkflowNode};
use crate::error::GraphError;
use ahash::AHashMap;

/// How the node that was just executed wants traversal to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Follow the default (untagged) edge.
    Unconditional,
    /// A decision evaluated to this outcome.
    Branch(bool),
    /// A decision could not be evaluated; only an explicit `false` edge is followed.
    Failed,
}

/// A validated, indexed workflow graph.
///
/// Built once per simulator; node indices are positions in declaration order.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    nodes: Vec<WorkflowNode>,
    edges: Vec<WorkflowEdge>,
    index: AHashMap<String, usize>,
    /// Outgoing edge indices per node, in declaration order.
    outgoing: Vec<Vec<usize>>,
    incoming_count: Vec<usize>,
}

impl WorkflowGraph {
    pub fn build(definition: WorkflowDefinition) -> Result<Self, GraphError> {
        let WorkflowDefinition { nodes, edges } = definition;
        if nodes.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut index = AHashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming_count = vec![0; nodes.len()];
        for (edge_idx, edge) in edges.iter().enumerate() {
            let source = *index
                .get(&edge.source)
                .ok_or_else(|| GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    missing_node_id: edge.source.clone(),
                })?;
            let target = *index
                .get(&edge.target)
                .ok_or_else(|| GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    missing_node_id: edge.target.clone(),
                })?;
            outgoing[source].push(edge_idx);
            incoming_count[target] += 1;
        }

        Ok(Self {
            nodes,
            edges,
            index,
            outgoing,
            incoming_count,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[WorkflowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[WorkflowEdge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> &WorkflowNode {
        &self.nodes[idx]
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn outgoing(&self, idx: usize) -> impl Iterator<Item = &WorkflowEdge> {
        self.outgoing[idx].iter().map(|&e| &self.edges[e])
    }

    /// Resolves the node a run starts from.
    ///
    /// Root nodes (no incoming edges) are candidates in declaration order. A single
    /// root wins outright; among several, the first input node is preferred. With no
    /// roots at all, the first input node anywhere in the graph is used.
    pub fn entry(&self) -> Result<usize, GraphError> {
        let roots: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.incoming_count[i] == 0)
            .collect();

        let is_input = |i: &usize| self.nodes[*i].kind.is_input_like();
        match roots.as_slice() {
            [single] => Ok(*single),
            [first, ..] => Ok(roots.iter().copied().find(is_input).unwrap_or(*first)),
            [] => (0..self.nodes.len())
                .find(is_input)
                .ok_or(GraphError::NoEntryNode),
        }
    }

    /// Selects the node that follows `idx`, or `None` when the run ends there.
    pub fn successor(&self, idx: usize, transition: Transition) -> Option<usize> {
        if self.nodes[idx].kind.is_terminal() {
            return None;
        }

        let untagged = || self.outgoing(idx).find(|e| e.source_handle.is_none());
        let chosen = match transition {
            Transition::Branch(outcome) => self
                .outgoing(idx)
                .find(|e| e.source_handle.is_some_and(|h| h.matches(outcome)))
                .or_else(untagged),
            Transition::Failed => self
                .outgoing(idx)
                .find(|e| e.source_handle.is_some_and(|h| h.matches(false))),
            Transition::Unconditional => untagged().or_else(|| self.outgoing(idx).next()),
        }?;

        self.node_index(&chosen.target)
    }
}
