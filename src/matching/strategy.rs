use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dense integer id of a tangle end inside one matching problem
pub type NodeId = usize;

/// An undirected pair of nodes, stored with `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
}

impl Edge {
    #[must_use]
    pub fn new(x: NodeId, y: NodeId) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    #[must_use]
    pub fn is_self_pair(&self) -> bool {
        self.a == self.b
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.a, self.b)
    }
}

/// A soft adjacency edge; weight is the number of genomes voting for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub edge: Edge,
    pub weight: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("Node {node} is outside the problem (node count {node_count})")]
    NodeOutOfRange { node: NodeId, node_count: usize },

    #[error("Edge {0} pairs a node with itself")]
    SelfEdge(Edge),

    #[error("Node {0} is covered by more than one edge")]
    NodeReused(NodeId),

    #[error("Node {0} is not covered by any chosen edge")]
    NodeUncovered(NodeId),

    #[error("Forced edge {0} is missing from the matching")]
    ForcedEdgeMissing(Edge),

    #[error("{0} free nodes cannot be perfectly matched")]
    OddFreeNodes(usize),

    #[error("{free} free nodes exceed the exact solver limit of {limit}")]
    TooLarge { free: usize, limit: usize },

    #[error("{0}")]
    Other(String),
}

/// Everything a strategy needs to choose the reference adjacencies of one flower
#[derive(Debug, Clone, Default)]
pub struct MatchingProblem {
    /// Nodes are `0..node_count`
    pub node_count: usize,

    /// Soft edges, at most one per node pair, weight >= 1
    pub adjacency_edges: Vec<WeightedEdge>,

    /// Forced edges inherited from the parent level (or paired arbitrarily at the root)
    pub stub_edges: Vec<Edge>,

    /// Forced edges fixed by already aligned blocks and chains
    pub chain_edges: Vec<Edge>,

    /// Nodes already paired with an end outside the node set; never matched
    pub pinned: Vec<NodeId>,

    /// Whether the flower is the root of its hierarchy
    pub is_root: bool,
}

impl MatchingProblem {
    /// Chain edges followed by stub edges
    pub fn forced_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.chain_edges.iter().chain(self.stub_edges.iter()).copied()
    }

    fn check_node(&self, node: NodeId) -> Result<(), SolverError> {
        if node >= self.node_count {
            return Err(SolverError::NodeOutOfRange {
                node,
                node_count: self.node_count,
            });
        }
        Ok(())
    }

    /// Mark pinned nodes and forced edges as matched.
    ///
    /// Returns the per-node matched flags and the forced edges, in the order
    /// strategies should emit them.
    ///
    /// # Errors
    ///
    /// Returns a `SolverError` if a forced edge is out of range, a self pair,
    /// or overlaps another forced edge or a pinned node.
    pub fn seed(&self) -> Result<(Vec<bool>, Vec<Edge>), SolverError> {
        let mut matched = vec![false; self.node_count];
        for &node in &self.pinned {
            self.check_node(node)?;
            if matched[node] {
                return Err(SolverError::NodeReused(node));
            }
            matched[node] = true;
        }

        let mut forced = Vec::with_capacity(self.chain_edges.len() + self.stub_edges.len());
        for edge in self.forced_edges() {
            self.check_node(edge.a)?;
            self.check_node(edge.b)?;
            if edge.is_self_pair() {
                return Err(SolverError::SelfEdge(edge));
            }
            for node in [edge.a, edge.b] {
                if matched[node] {
                    return Err(SolverError::NodeReused(node));
                }
                matched[node] = true;
            }
            forced.push(edge);
        }
        Ok((matched, forced))
    }

    /// Check that `chosen` honors the matching contract: every forced edge is
    /// present, every non-pinned node is covered exactly once, pinned nodes
    /// are never covered.
    ///
    /// # Errors
    ///
    /// Returns the first contract violation found.
    pub fn validate(&self, chosen: &[Edge]) -> Result<(), SolverError> {
        let mut covered = vec![false; self.node_count];
        for &node in &self.pinned {
            self.check_node(node)?;
            covered[node] = true;
        }
        for edge in chosen {
            self.check_node(edge.a)?;
            self.check_node(edge.b)?;
            if edge.is_self_pair() {
                return Err(SolverError::SelfEdge(*edge));
            }
            for node in [edge.a, edge.b] {
                if covered[node] {
                    return Err(SolverError::NodeReused(node));
                }
                covered[node] = true;
            }
        }
        if let Some(node) = covered.iter().position(|&c| !c) {
            return Err(SolverError::NodeUncovered(node));
        }

        let mut chosen_sorted: Vec<Edge> = chosen.iter().map(|e| Edge::new(e.a, e.b)).collect();
        chosen_sorted.sort_unstable();
        for edge in self.forced_edges() {
            if chosen_sorted.binary_search(&edge).is_err() {
                return Err(SolverError::ForcedEdgeMissing(edge));
            }
        }
        Ok(())
    }
}

/// Chooses a perfect matching for a [`MatchingProblem`].
///
/// Implementations must return every forced edge and cover each non-pinned
/// node exactly once, and should prefer heavy adjacency edges. Any closure
/// `Fn(&MatchingProblem) -> Result<Vec<Edge>, SolverError>` is a strategy.
pub trait MatchingStrategy {
    /// Short name used in logs
    fn name(&self) -> &str {
        "custom"
    }

    /// Choose the matching
    ///
    /// # Errors
    ///
    /// Returns a `SolverError` when no valid matching can be produced.
    fn solve(&self, problem: &MatchingProblem) -> Result<Vec<Edge>, SolverError>;
}

impl<F> MatchingStrategy for F
where
    F: Fn(&MatchingProblem) -> Result<Vec<Edge>, SolverError>,
{
    fn solve(&self, problem: &MatchingProblem) -> Result<Vec<Edge>, SolverError> {
        self(problem)
    }
}
