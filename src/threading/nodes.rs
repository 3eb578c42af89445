use std::collections::HashMap;

use crate::core::{EndId, FlowerId, GenomeGraph};
use crate::matching::NodeId;
use crate::threading::ThreadError;

/// Bijection between the tangle-group ends of one flower and `0..n`.
///
/// Ids follow enumeration order: tangle groups in flower order, ends in
/// group order. Link-group ends and ungrouped ends get no id.
#[derive(Debug, Clone)]
pub struct NodeMap {
    ends: Vec<EndId>,
    index: HashMap<EndId, NodeId>,
}

impl NodeMap {
    /// Number the tangle ends of `flower`
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::PreconditionViolation` if the flower has no
    /// tangle ends.
    pub fn build(graph: &GenomeGraph, flower: FlowerId) -> Result<Self, ThreadError> {
        let ends: Vec<EndId> = graph
            .flower(flower)
            .groups
            .iter()
            .map(|&g| graph.group(g))
            .filter(|group| group.is_tangle())
            .flat_map(|group| group.ends.iter().copied())
            .collect();

        if ends.is_empty() {
            return Err(ThreadError::precondition(format!(
                "{flower} has no tangle ends to thread"
            )));
        }

        let index = ends.iter().enumerate().map(|(i, &e)| (e, i)).collect();
        Ok(Self { ends, index })
    }

    /// Node id of a tangle end
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::PreconditionViolation` if `end` is not a tangle end
    /// of the mapped flower.
    pub fn node(&self, end: EndId) -> Result<NodeId, ThreadError> {
        self.get(end)
            .ok_or_else(|| ThreadError::precondition(format!("{end} is not a tangle end")))
    }

    #[must_use]
    pub fn get(&self, end: EndId) -> Option<NodeId> {
        self.index.get(&end).copied()
    }

    /// End behind a node id
    ///
    /// # Errors
    ///
    /// Returns `ThreadError::PreconditionViolation` if the id is out of range.
    pub fn end(&self, node: NodeId) -> Result<EndId, ThreadError> {
        self.ends.get(node).copied().ok_or_else(|| {
            ThreadError::precondition(format!(
                "Node {node} is out of range (node count {})",
                self.ends.len()
            ))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// `(node, end)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, EndId)> + '_ {
        self.ends.iter().copied().enumerate()
    }
}
