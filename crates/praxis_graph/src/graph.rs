// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flat action container plus index-pair edges for one step.

use crate::action::ActionNode;
use crate::edge::Edge;
use serde::{Deserialize, Serialize};

/// The action graph of one procedure step.
///
/// Actions live in a flat, insertion-ordered container; edges are index
/// pairs into it. Only nodes reachable from an entry edge participate
/// in execution - anything else is dead data the authoring tool may
/// still be holding on to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionGraph {
    nodes: Vec<ActionNode>,
    edges: Vec<Edge>,
}

impl ActionGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Append a node, returning its index
    pub fn add_node(&mut self, node: ActionNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Get a node by index
    pub fn node(&self, index: usize) -> Option<&ActionNode> {
        self.nodes.get(index)
    }

    /// Get a mutable node by index
    pub fn node_mut(&mut self, index: usize) -> Option<&mut ActionNode> {
        self.nodes.get_mut(index)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[ActionNode] {
        &self.nodes
    }

    /// Mutable iterator over all nodes
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ActionNode> {
        self.nodes.iter_mut()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add an edge after validating its indices
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), EdgeError> {
        if edge.to >= self.nodes.len() {
            return Err(EdgeError::NodeOutOfRange(edge.to));
        }
        if let Some(from) = edge.from {
            if from >= self.nodes.len() {
                return Err(EdgeError::NodeOutOfRange(from));
            }
            if from == edge.to {
                return Err(EdgeError::SelfLoop(from));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// All edges in declaration order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Entry edges in declaration order
    pub fn entry_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_entry())
    }

    /// Outgoing edges of a node, in declaration order
    pub fn edges_from(&self, index: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.from == Some(index))
    }

    /// Number of edges leading into a node (entry edges included)
    pub fn incoming_count(&self, index: usize) -> usize {
        self.edges.iter().filter(|e| e.to == index).count()
    }

    /// Nodes reachable through two or more incoming edges.
    ///
    /// Such a node executes once per incoming activation during live
    /// and skip replay - whether that is intended is the author's call,
    /// so the query surfaces them for auditing.
    pub fn execute_twice(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.incoming_count(i) >= 2)
            .collect()
    }

    /// Nodes with no outgoing edge
    pub fn terminal_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.edges_from(i).next().is_none())
            .collect()
    }

    /// Total delay along the predecessor chain from an entry edge to
    /// `index`, following the first incoming edge at each hop.
    ///
    /// Returns `0.0` when `index` is unreachable from any entry edge.
    pub fn time_to_reach(&self, index: usize) -> f32 {
        let mut visited = vec![false; self.nodes.len()];
        let mut total = 0.0;
        let mut cursor = index;

        loop {
            if cursor >= self.nodes.len() || visited[cursor] {
                return 0.0;
            }
            visited[cursor] = true;

            let Some(incoming) = self.edges.iter().find(|e| e.to == cursor) else {
                return 0.0;
            };
            match incoming.from {
                None => return total,
                Some(pred) => {
                    let Some(node) = self.node(pred) else {
                        return 0.0;
                    };
                    total += node.effective_elapse();
                    cursor = pred;
                }
            }
        }
    }
}

/// Error when adding an edge
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Edge endpoint does not name a node
    #[error("Node index out of range: {0}")]
    NodeOutOfRange(usize),

    /// Self-loop not allowed
    #[error("Self-loop on node {0}")]
    SelfLoop(usize),
}
