//! Edge extraction: turns the current topology of a flower into the forced
//! and soft edges of its matching problem.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::core::{CapId, EndId, FlowerId, GenomeGraph, GroupKind, Name, Side};
use crate::matching::{Edge, NodeId, WeightedEdge};
use crate::threading::nodes::NodeMap;
use crate::threading::ThreadError;

/// Whether `end` sits in a tangle group; ungrouped ends are a precondition
/// violation once the flower has been normalized
fn in_tangle_group(graph: &GenomeGraph, end: EndId) -> Result<bool, ThreadError> {
    let group = graph
        .end(end)
        .group
        .ok_or_else(|| ThreadError::precondition(format!("{end} has no group")))?;
    Ok(graph.group(group).is_tangle())
}

/// Whether `x` and `y` are the two ends of one link
fn same_link(graph: &GenomeGraph, x: EndId, y: EndId) -> bool {
    let Some(group) = graph.end(x).group else {
        return false;
    };
    let GroupKind::Link(link) = graph.group(group).kind else {
        return false;
    };
    let record = graph.link(link);
    (record.five_end, record.three_end) == (x, y) || (record.five_end, record.three_end) == (y, x)
}

fn node_edge(nodes: &NodeMap, x: EndId, y: EndId) -> Result<Edge, ThreadError> {
    let edge = Edge::new(nodes.node(x)?, nodes.node(y)?);
    if edge.is_self_pair() {
        return Err(ThreadError::precondition(format!(
            "{x} would be paired with itself"
        )));
    }
    Ok(edge)
}

/// Forced edges fixed by already aligned structure.
///
/// For each chain whose outermost links end on block ends, the two ends
/// facing out of the chain are paired. For each block with both ends in
/// tangle groups, the block's own ends are paired. Blocks with a link-group
/// end are covered by their chain.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` for an empty chain, an
/// ungrouped block end, or an outward chain end that is not a tangle end.
pub fn chain_edges(
    graph: &GenomeGraph,
    flower: FlowerId,
    nodes: &NodeMap,
) -> Result<Vec<Edge>, ThreadError> {
    let mut edges = Vec::new();

    for &chain in &graph.flower(flower).chains {
        let links = &graph.chain(chain).links;
        let (Some(&first), Some(&last)) = (links.first(), links.last()) else {
            return Err(ThreadError::precondition(format!("{chain} has no links")));
        };
        let five = graph.link(first).five_end;
        let three = graph.link(last).three_end;
        if let (Some(x), Some(y)) = (graph.other_block_end(five), graph.other_block_end(three)) {
            edges.push(node_edge(nodes, x, y)?);
        }
    }

    for &block in &graph.flower(flower).blocks {
        let record = graph.block(block);
        let five_tangle = in_tangle_group(graph, record.five_end)?;
        let three_tangle = in_tangle_group(graph, record.three_end)?;
        if five_tangle && three_tangle {
            edges.push(node_edge(nodes, record.five_end, record.three_end)?);
        }
    }

    Ok(edges)
}

/// Root-level stub edges: the nodes no chain edge touches, paired in
/// ascending order.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` if the number of such nodes
/// is odd or zero.
pub fn arbitrary_stub_edges(
    nodes: &NodeMap,
    chain_edges: &[Edge],
) -> Result<Vec<Edge>, ThreadError> {
    let mut free: BTreeSet<NodeId> = (0..nodes.len()).collect();
    for edge in chain_edges {
        free.remove(&edge.a);
        free.remove(&edge.b);
    }
    if free.is_empty() || free.len() % 2 != 0 {
        return Err(ThreadError::precondition(format!(
            "{} nodes are left for stub pairing, expected an even, nonzero count",
            free.len()
        )));
    }

    let free: Vec<NodeId> = free.into_iter().collect();
    Ok(free
        .chunks_exact(2)
        .map(|pair| Edge::new(pair[0], pair[1]))
        .collect())
}

/// Stub pairings read from the parent level's reference thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubEdges {
    /// Forced edges between two grouped tangle ends
    pub edges: Vec<Edge>,

    /// `(imported end, grouped partner)`: committed directly, since the
    /// imported end has no group and so no node id yet
    pub imported: Vec<(EndId, EndId)>,

    /// Node ids of the grouped partners in `imported`
    pub pinned: Vec<NodeId>,
}

/// Follow the parent's reference adjacency from the counterpart of `end`
/// and project the adjacent parent end back into `flower`
fn project_parent_adjacency(
    graph: &GenomeGraph,
    flower: FlowerId,
    end: EndId,
    reference_event: Name,
) -> Result<EndId, ThreadError> {
    let parent_group = graph
        .parent_group(flower)
        .ok_or_else(|| ThreadError::precondition(format!("{flower} has no parent group")))?;
    let parent_flower = graph.group(parent_group).flower;
    let name = graph.end(end).name;

    let parent_end = graph
        .end_by_name(parent_flower, name)
        .filter(|&e| graph.end(e).group == Some(parent_group))
        .ok_or_else(|| {
            ThreadError::precondition(format!(
                "{end} (name {name}) has no counterpart in parent {parent_group}"
            ))
        })?;
    let cap = graph
        .cap_with_event(parent_end, reference_event)
        .ok_or_else(|| {
            ThreadError::precondition(format!("Parent {parent_end} has no reference cap"))
        })?;
    let adjacent = graph.cap(cap).adjacency.ok_or_else(|| {
        ThreadError::precondition(format!("Reference {cap} of parent {parent_end} has no adjacency"))
    })?;

    let adjacent_name = graph.end(graph.cap(adjacent).end).name;
    graph.end_by_name(flower, adjacent_name).ok_or_else(|| {
        ThreadError::precondition(format!(
            "End named {adjacent_name}, adjacent to {end} in the parent, is missing from {flower}"
        ))
    })
}

/// Below-root stub edges: every attached stub end is paired with the end its
/// parent-level counterpart is adjacent to on the reference thread.
///
/// # Errors
///
/// Returns `ThreadError::DuplicateResolution` if an end is reached twice or
/// paired with itself, and `ThreadError::PreconditionViolation` if the parent
/// linkage is missing, the pair mixes a tangle end with a link end, two link
/// ends are not the ends of one link, or two imported ends meet.
pub fn stub_edges_from_parent(
    graph: &GenomeGraph,
    flower: FlowerId,
    nodes: &NodeMap,
    imported: &[EndId],
    reference_event: Name,
) -> Result<StubEdges, ThreadError> {
    let imported: HashSet<EndId> = imported.iter().copied().collect();
    let mut seen: HashSet<EndId> = HashSet::new();
    let mut stubs = StubEdges::default();

    for &end in &graph.flower(flower).ends {
        if !graph.end(end).is_attached_stub() || seen.contains(&end) {
            continue;
        }
        let partner = project_parent_adjacency(graph, flower, end, reference_event)?;
        if partner == end {
            return Err(ThreadError::duplicate(format!(
                "{end} is adjacent to itself in the parent reference thread"
            )));
        }
        if !seen.insert(partner) {
            return Err(ThreadError::duplicate(format!(
                "{partner} is reached by more than one parent adjacency"
            )));
        }
        seen.insert(end);

        match (imported.contains(&end), imported.contains(&partner)) {
            (false, false) => {
                let end_tangle = in_tangle_group(graph, end)?;
                let partner_tangle = in_tangle_group(graph, partner)?;
                match (end_tangle, partner_tangle) {
                    (true, true) => stubs.edges.push(node_edge(nodes, end, partner)?),
                    // Already resolved; the link must agree with the parent
                    (false, false) => {
                        if !same_link(graph, end, partner) {
                            return Err(ThreadError::precondition(format!(
                                "{end} and {partner} are adjacent in the parent thread but not linked in {flower}"
                            )));
                        }
                    }
                    _ => {
                        return Err(ThreadError::precondition(format!(
                            "{end} and {partner} pair a tangle end with a link end"
                        )))
                    }
                }
            }
            (true, false) | (false, true) => {
                let (new, grouped) = if imported.contains(&end) {
                    (end, partner)
                } else {
                    (partner, end)
                };
                stubs.pinned.push(nodes.node(grouped)?);
                stubs.imported.push((new, grouped));
            }
            (true, true) => {
                return Err(ThreadError::precondition(format!(
                    "Imported ends {end} and {partner} are paired with each other, neither has a group"
                )));
            }
        }
    }

    debug!(
        %flower,
        forced = stubs.edges.len(),
        imported = stubs.imported.len(),
        "Stub edges read from parent"
    );
    Ok(stubs)
}

/// Whether the adjacency `cap` -> `adjacent` is the one of its symmetric
/// pair that gets counted: the side on the 5' end when the sides differ,
/// otherwise the lower cap id
fn counts_adjacency(graph: &GenomeGraph, cap: CapId, adjacent: CapId) -> bool {
    let side = graph.end(graph.cap(cap).end).side;
    let adjacent_side = graph.end(graph.cap(adjacent).end).side;
    if side == adjacent_side {
        cap < adjacent
    } else {
        side == Side::FivePrime
    }
}

/// Soft edges voted by the embedded genomes: every non-reference adjacency
/// between two distinct tangle ends counts once, and repeated pairs merge into
/// a single edge weighted by their multiplicity.
#[must_use]
pub fn adjacency_edges(
    graph: &GenomeGraph,
    nodes: &NodeMap,
    reference_event: Name,
) -> Vec<WeightedEdge> {
    let mut votes: BTreeMap<Edge, u32> = BTreeMap::new();

    for (node, end) in nodes.iter() {
        for &cap in &graph.end(end).caps {
            let record = graph.cap(cap);
            if graph.event(record.event).name == reference_event {
                continue;
            }
            let Some(adjacent) = record.adjacency else {
                continue;
            };
            let Some(other) = nodes.get(graph.cap(adjacent).end) else {
                continue;
            };
            if other == node || !counts_adjacency(graph, cap, adjacent) {
                continue;
            }
            *votes.entry(Edge::new(node, other)).or_insert(0) += 1;
        }
    }

    votes
        .into_iter()
        .map(|(edge, weight)| WeightedEdge { edge, weight })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventId, GroupId};

    /// Root flower with one tangle group holding `n` attached stubs
    fn tangle(n: usize) -> (GenomeGraph, FlowerId, GroupId, Vec<EndId>) {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let group = graph.add_tangle_group(flower);
        let ends = (0..n)
            .map(|i| {
                let side = if i % 2 == 0 { Side::FivePrime } else { Side::ThreePrime };
                let end = graph.add_stub_end(flower, true, side);
                graph.set_end_group(end, group).unwrap();
                end
            })
            .collect();
        (graph, flower, group, ends)
    }

    fn add_genome(graph: &mut GenomeGraph, flower: FlowerId, header: &str) -> EventId {
        let tree = graph.flower(flower).event_tree;
        let root = graph.event_tree(tree).root;
        graph.add_event(tree, header, Some(root), 1.0)
    }

    #[test]
    fn test_block_in_tangle_gives_chain_edge() {
        let (mut graph, flower, group, _) = tangle(2);
        let block = graph.add_block(flower, 7);
        let (five, three) = (graph.block(block).five_end, graph.block(block).three_end);
        graph.set_end_group(five, group).unwrap();
        graph.set_end_group(three, group).unwrap();

        let nodes = NodeMap::build(&graph, flower).unwrap();
        let edges = chain_edges(&graph, flower, &nodes).unwrap();
        assert_eq!(edges, vec![Edge::new(2, 3)]);
    }

    #[test]
    fn test_chain_pairs_outward_ends() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let group = graph.add_tangle_group(flower);
        let b1 = graph.add_block(flower, 10);
        let b2 = graph.add_block(flower, 10);
        let b3 = graph.add_block(flower, 10);
        let gap1 = (graph.block(b1).three_end, graph.block(b2).five_end);
        let gap2 = (graph.block(b2).three_end, graph.block(b3).five_end);
        graph.add_chain(flower, &[gap1, gap2]).unwrap();
        let outward = [graph.block(b1).five_end, graph.block(b3).three_end];
        for end in outward {
            graph.set_end_group(end, group).unwrap();
        }

        let nodes = NodeMap::build(&graph, flower).unwrap();
        let edges = chain_edges(&graph, flower, &nodes).unwrap();
        assert_eq!(edges, vec![Edge::new(0, 1)]);
    }

    #[test]
    fn test_ungrouped_block_end_is_rejected() {
        let (mut graph, flower, group, _) = tangle(2);
        let block = graph.add_block(flower, 3);
        let five = graph.block(block).five_end;
        graph.set_end_group(five, group).unwrap();

        let nodes = NodeMap::build(&graph, flower).unwrap();
        assert!(matches!(
            chain_edges(&graph, flower, &nodes),
            Err(ThreadError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_arbitrary_stub_edges_skip_chain_nodes() {
        let (graph, flower, _, _) = tangle(6);
        let nodes = NodeMap::build(&graph, flower).unwrap();

        let stubs = arbitrary_stub_edges(&nodes, &[Edge::new(1, 4)]).unwrap();
        assert_eq!(stubs, vec![Edge::new(0, 2), Edge::new(3, 5)]);

        let covered = [Edge::new(0, 1), Edge::new(2, 3), Edge::new(4, 5)];
        assert!(arbitrary_stub_edges(&nodes, &covered).is_err());
        assert!(arbitrary_stub_edges(&nodes, &[Edge::new(0, 1), Edge::new(2, 4)]).is_ok());
    }

    #[test]
    fn test_odd_leftover_is_rejected() {
        let (graph, flower, _, _) = tangle(5);
        let nodes = NodeMap::build(&graph, flower).unwrap();
        assert!(matches!(
            arbitrary_stub_edges(&nodes, &[Edge::new(0, 1)]),
            Err(ThreadError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_repeated_votes_merge() {
        let (mut graph, flower, _, ends) = tangle(6);
        for header in ["human", "chimp", "gorilla"] {
            let event = add_genome(&mut graph, flower, header);
            let a = graph.add_cap(ends[2], event);
            let b = graph.add_cap(ends[5], event);
            graph.link_caps(a, b).unwrap();
        }
        let event = add_genome(&mut graph, flower, "mouse");
        let a = graph.add_cap(ends[0], event);
        let b = graph.add_cap(ends[1], event);
        graph.link_caps(a, b).unwrap();

        let nodes = NodeMap::build(&graph, flower).unwrap();
        let reference = graph.fresh_name();
        let edges = adjacency_edges(&graph, &nodes, reference);
        assert_eq!(
            edges,
            vec![
                WeightedEdge { edge: Edge::new(0, 1), weight: 1 },
                WeightedEdge { edge: Edge::new(2, 5), weight: 3 },
            ]
        );
    }

    #[test]
    fn test_same_side_adjacency_counted_once() {
        let (mut graph, flower, _, ends) = tangle(4);
        let event = add_genome(&mut graph, flower, "human");
        // ends[0] and ends[2] are both 5' ends
        let a = graph.add_cap(ends[0], event);
        let b = graph.add_cap(ends[2], event);
        graph.link_caps(a, b).unwrap();

        let nodes = NodeMap::build(&graph, flower).unwrap();
        let reference = graph.fresh_name();
        let edges = adjacency_edges(&graph, &nodes, reference);
        assert_eq!(edges, vec![WeightedEdge { edge: Edge::new(0, 2), weight: 1 }]);
    }

    #[test]
    fn test_reference_adjacencies_are_not_votes() {
        let (mut graph, flower, _, ends) = tangle(2);
        let event = add_genome(&mut graph, flower, "reference");
        let a = graph.add_cap(ends[0], event);
        let b = graph.add_cap(ends[1], event);
        graph.link_caps(a, b).unwrap();

        let nodes = NodeMap::build(&graph, flower).unwrap();
        let reference = graph.event(event).name;
        assert!(adjacency_edges(&graph, &nodes, reference).is_empty());
    }
}
