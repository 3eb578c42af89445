use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::{EventId, FlowerId, GenomeGraph, Name};
use crate::matching::{
    ExactMatching, GreedyMatching, MatchingProblem, MatchingStrategy, DEFAULT_MAX_EXACT_NODES,
};
use crate::threading::check::check_flower;
use crate::threading::edges::{
    adjacency_edges, arbitrary_stub_edges, chain_edges, stub_edges_from_parent, StubEdges,
};
use crate::threading::materialize::commit;
use crate::threading::nodes::NodeMap;
use crate::threading::normalize::{break_single_end_groups, import_parent_stubs};
use crate::threading::ThreadError;

/// Header of the reference event when none is configured
pub const DEFAULT_REFERENCE_HEADER: &str = "reference";

/// Branch length given to a newly created reference event
#[allow(clippy::cast_lossless)]
pub const REFERENCE_BRANCH_LENGTH: f64 = i32::MAX as f64;

/// Bundled matching strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Heaviest adjacency first
    #[default]
    Greedy,
    /// Maximum-weight matching, small flowers only
    Exact,
}

/// Settings for threading a whole hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadingConfig {
    /// Header identifying the reference event at every level
    pub reference_header: String,

    pub solver: SolverKind,

    /// Free-node limit of the exact solver
    pub max_exact_nodes: usize,
}

impl Default for ThreadingConfig {
    fn default() -> Self {
        Self {
            reference_header: DEFAULT_REFERENCE_HEADER.to_string(),
            solver: SolverKind::default(),
            max_exact_nodes: DEFAULT_MAX_EXACT_NODES,
        }
    }
}

impl ThreadingConfig {
    /// The configured matching strategy
    #[must_use]
    pub fn strategy(&self) -> Box<dyn MatchingStrategy> {
        match self.solver {
            SolverKind::Greedy => Box::new(GreedyMatching),
            SolverKind::Exact => Box::new(ExactMatching {
                max_free_nodes: self.max_exact_nodes,
            }),
        }
    }
}

/// What threading one flower did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadReport {
    pub flower: FlowerId,
    pub parent: Option<FlowerId>,
    pub solver: String,
    pub reference_event: Name,
    pub nodes: usize,
    pub chain_edges: usize,
    pub stub_edges: usize,
    pub adjacency_edges: usize,
    /// Sum of adjacency edge weights
    pub adjacency_votes: u32,
    pub imported_ends: usize,
    pub link_breaking_blocks: usize,
    pub bridge_blocks: usize,
    pub link_edges: usize,
    /// Reference adjacencies committed, link edges and imported pairs included
    pub adjacencies: usize,
}

/// Get the reference event of `flower`, creating it when absent.
///
/// At the root a new event is parented to the tree's root event. Below the
/// root the new event reuses the name of the parent flower's reference event,
/// so reference caps can be followed across levels.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` if a non-root flower's parent
/// has no event with the header.
pub fn reference_event(
    graph: &mut GenomeGraph,
    flower: FlowerId,
    header: &str,
) -> Result<EventId, ThreadError> {
    let tree = graph.flower(flower).event_tree;
    if let Some(event) = graph.event_by_header(tree, header) {
        return Ok(event);
    }
    let root = graph.event_tree(tree).root;

    let Some(parent) = graph.parent_flower(flower) else {
        debug!(%flower, header, "Creating root reference event");
        return Ok(graph.add_event(tree, header, Some(root), REFERENCE_BRANCH_LENGTH));
    };
    let parent_tree = graph.flower(parent).event_tree;
    let parent_event = graph.event_by_header(parent_tree, header).ok_or_else(|| {
        ThreadError::precondition(format!(
            "Parent {parent} of {flower} has no event with header {header:?}"
        ))
    })?;
    let name = graph.event(parent_event).name;
    Ok(graph.add_event_named(tree, name, header, Some(root), REFERENCE_BRANCH_LENGTH))
}

/// Thread the reference event through one flower.
///
/// The parent flower, if any, must already be threaded: its reference
/// adjacencies fix this flower's stub edges.
///
/// # Errors
///
/// Returns the first `ThreadError` raised by normalization, edge extraction,
/// the strategy or the commit. Reference caps and adjacencies are only
/// written once every pair has been validated. In debug builds the
/// structural check runs after the commit, so its errors leave the thread
/// in place.
pub fn build_reference<S: MatchingStrategy + ?Sized>(
    graph: &mut GenomeGraph,
    flower: FlowerId,
    reference_header: &str,
    strategy: &S,
) -> Result<ThreadReport, ThreadError> {
    let reference = reference_event(graph, flower, reference_header)?;
    let reference_name = graph.event(reference).name;
    let parent = graph.parent_flower(flower);

    let imported = import_parent_stubs(graph, flower)?;
    let link_breaking = break_single_end_groups(graph, flower)?;

    let nodes = NodeMap::build(graph, flower)?;
    let chain = chain_edges(graph, flower, &nodes)?;
    let stubs = match parent {
        None => StubEdges {
            edges: arbitrary_stub_edges(&nodes, &chain)?,
            ..StubEdges::default()
        },
        Some(_) => stub_edges_from_parent(graph, flower, &nodes, &imported, reference_name)?,
    };
    let adjacency = adjacency_edges(graph, &nodes, reference_name);

    let problem = MatchingProblem {
        node_count: nodes.len(),
        adjacency_edges: adjacency,
        stub_edges: stubs.edges,
        chain_edges: chain,
        pinned: stubs.pinned,
        is_root: parent.is_none(),
    };
    debug!(
        %flower,
        solver = strategy.name(),
        nodes = problem.node_count,
        chain_edges = problem.chain_edges.len(),
        stub_edges = problem.stub_edges.len(),
        adjacency_edges = problem.adjacency_edges.len(),
        pinned = problem.pinned.len(),
        "Solving matching"
    );
    let chosen = strategy.solve(&problem)?;
    problem.validate(&chosen)?;

    let committed = commit(
        graph,
        flower,
        &nodes,
        &chosen,
        &stubs.imported,
        &imported,
        reference,
    )?;

    if cfg!(debug_assertions) {
        check_flower(graph, flower, reference)?;
    }

    let report = ThreadReport {
        flower,
        parent,
        solver: strategy.name().to_string(),
        reference_event: reference_name,
        nodes: problem.node_count,
        chain_edges: problem.chain_edges.len(),
        stub_edges: problem.stub_edges.len(),
        adjacency_edges: problem.adjacency_edges.len(),
        adjacency_votes: problem.adjacency_edges.iter().map(|e| e.weight).sum(),
        imported_ends: imported.len(),
        link_breaking_blocks: link_breaking.len(),
        bridge_blocks: committed.bridge_blocks.len(),
        link_edges: committed.link_edges,
        adjacencies: committed.adjacencies,
    };
    info!(
        %flower,
        nodes = report.nodes,
        adjacencies = report.adjacencies,
        bridges = report.bridge_blocks,
        "Threaded flower"
    );
    Ok(report)
}

/// Thread every flower below and including `root`, parents before children,
/// breadth first. Stops at the first failing flower.
///
/// # Errors
///
/// Returns the `ThreadError` of the first flower that cannot be threaded.
pub fn thread_hierarchy(
    graph: &mut GenomeGraph,
    root: FlowerId,
    config: &ThreadingConfig,
) -> Result<Vec<ThreadReport>, ThreadError> {
    let strategy = config.strategy();
    let mut queue = VecDeque::from([root]);
    let mut reports = Vec::new();

    while let Some(flower) = queue.pop_front() {
        reports.push(build_reference(
            graph,
            flower,
            &config.reference_header,
            strategy.as_ref(),
        )?);
        queue.extend(
            graph
                .flower(flower)
                .groups
                .iter()
                .filter_map(|&g| graph.group(g).nested),
        );
    }

    info!(flowers = reports.len(), solver = strategy.name(), "Threaded hierarchy");
    Ok(reports)
}
