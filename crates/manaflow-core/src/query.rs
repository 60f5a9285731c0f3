//! Read-only views for inspection and hover display.
//!
//! Views are owned copies; nothing here borrows engine storage.

use crate::flow::FlowUnit;
use crate::grid::GridPosition;
use crate::id::NodeId;
use crate::node::{NodeStatus, ProductionNode};
use std::fmt;

/// Snapshot of one placed node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub position: GridPosition,
    /// Status from the most recent tick; `None` before the node's first tick.
    pub status: Option<NodeStatus>,
    pub inputs: Vec<FlowUnit>,
    pub outputs: Vec<FlowUnit>,
}

impl NodeView {
    pub(crate) fn new(id: NodeId, node: &ProductionNode, status: Option<NodeStatus>) -> Self {
        Self {
            id,
            position: node.position,
            status,
            inputs: node.inputs.clone(),
            outputs: node.outputs.clone(),
        }
    }
}

impl fmt::Display for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = ProductionNode {
            position: self.position,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        };
        write!(f, "{node}")
    }
}
