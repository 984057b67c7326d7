//! Record of targets mutated during a tick

use crate::identity::{EdgeId, NodeId};
use std::collections::BTreeSet;

/// Targets successfully mutated since the last [`Changes::clear`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    /// Changed nodes
    pub nodes: BTreeSet<NodeId>,
    /// Changed edges
    pub edges: BTreeSet<EdgeId>,
    /// Changed variables, by store index
    pub variables: BTreeSet<usize>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    pub fn record_edge(&mut self, id: EdgeId) {
        self.edges.insert(id);
    }

    pub fn record_variable(&mut self, index: usize) {
        self.variables.insert(index);
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.variables.is_empty()
    }

    /// Forget everything recorded
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.variables.clear();
    }
}
