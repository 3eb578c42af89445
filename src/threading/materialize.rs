//! Commits a chosen matching into the graph as reference-event caps and
//! adjacencies.

use std::collections::HashSet;

use tracing::debug;

use crate::core::{BlockId, CapId, EndId, EventId, FlowerId, GenomeGraph, GroupId, GroupKind};
use crate::matching::Edge;
use crate::threading::nodes::NodeMap;
use crate::threading::normalize::FABRICATED_BLOCK_LENGTH;
use crate::threading::ThreadError;

/// Two ends to be joined on the reference thread
pub type EndPair = (EndId, EndId);

/// What one commit added to the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Committed {
    pub bridge_blocks: Vec<BlockId>,
    pub link_edges: usize,
    pub adjacencies: usize,
}

/// Translate chosen node edges back into end pairs
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` for a node id outside the map.
pub fn resolve_edges(nodes: &NodeMap, chosen: &[Edge]) -> Result<Vec<EndPair>, ThreadError> {
    chosen
        .iter()
        .map(|edge| Ok((nodes.end(edge.a)?, nodes.end(edge.b)?)))
        .collect()
}

/// For every pair whose ends sit in different groups, build a length-1
/// bridge block with its 5' end in the first end's group and its 3' end in
/// the second's, and split the pair into two within-group pairs.
///
/// Returns the rewritten pairs and the new blocks.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` if an end has no group.
pub fn add_bridge_blocks(
    graph: &mut GenomeGraph,
    flower: FlowerId,
    pairs: Vec<EndPair>,
) -> Result<(Vec<EndPair>, Vec<BlockId>), ThreadError> {
    let mut rewritten = Vec::with_capacity(pairs.len());
    let mut blocks = Vec::new();

    for (x, y) in pairs {
        let group_x = graph
            .end(x)
            .group
            .ok_or_else(|| ThreadError::precondition(format!("{x} has no group")))?;
        let group_y = graph
            .end(y)
            .group
            .ok_or_else(|| ThreadError::precondition(format!("{y} has no group")))?;
        if group_x == group_y {
            rewritten.push((x, y));
            continue;
        }

        let block = graph.add_block(flower, FABRICATED_BLOCK_LENGTH);
        let (five_end, three_end) = {
            let record = graph.block(block);
            (record.five_end, record.three_end)
        };
        graph.set_end_group(five_end, group_x)?;
        graph.set_end_group(three_end, group_y)?;
        rewritten.push((x, five_end));
        rewritten.push((three_end, y));
        blocks.push(block);
    }

    if !blocks.is_empty() {
        debug!(%flower, bridges = blocks.len(), "Added bridge blocks");
    }
    Ok((rewritten, blocks))
}

/// Append the already resolved adjacency of every link group: its link's 5'
/// and 3' ends. Returns how many pairs were appended.
pub fn append_link_edges(
    graph: &GenomeGraph,
    flower: FlowerId,
    pairs: &mut Vec<EndPair>,
) -> usize {
    let before = pairs.len();
    for &group in &graph.flower(flower).groups {
        if let GroupKind::Link(link) = graph.group(group).kind {
            let record = graph.link(link);
            pairs.push((record.five_end, record.three_end));
        }
    }
    pairs.len() - before
}

/// Check that `pairs` can all be committed: no end appears twice and no end
/// already has an adjacent reference cap.
///
/// # Errors
///
/// Returns `ThreadError::DuplicateResolution` on the first offending end.
pub fn check_pairs(
    graph: &GenomeGraph,
    pairs: &[EndPair],
    reference_event: EventId,
) -> Result<(), ThreadError> {
    let name = graph.event(reference_event).name;
    let mut used = HashSet::with_capacity(pairs.len() * 2);
    for &(x, y) in pairs {
        for end in [x, y] {
            if !used.insert(end) {
                return Err(ThreadError::duplicate(format!(
                    "{end} would receive two reference adjacencies"
                )));
            }
            if let Some(cap) = graph.cap_with_event(end, name) {
                if let Some(adjacent) = graph.cap(cap).adjacency {
                    return Err(ThreadError::duplicate(format!(
                        "Reference {cap} of {end} is already adjacent to {adjacent}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// The reference cap of `end`, creating it when missing: a block end gets a
/// whole reference segment, any other end a bare cap
fn reference_cap(graph: &mut GenomeGraph, end: EndId, reference_event: EventId) -> CapId {
    let name = graph.event(reference_event).name;
    if let Some(cap) = graph.cap_with_event(end, name) {
        return cap;
    }
    match graph.end(end).block() {
        Some(block) => {
            let segment = graph.add_segment(block, reference_event);
            let record = graph.segment(segment);
            if graph.block(block).five_end == end {
                record.five_cap
            } else {
                record.three_cap
            }
        }
        None => graph.add_cap(end, reference_event),
    }
}

/// Join every pair on the reference thread, creating reference caps and
/// segments as needed. All pairs are checked before the first one is linked.
///
/// # Errors
///
/// Returns `ThreadError::DuplicateResolution` if an end appears twice or
/// already carries a reference adjacency.
pub fn add_adjacencies_and_segments(
    graph: &mut GenomeGraph,
    pairs: &[EndPair],
    reference_event: EventId,
) -> Result<usize, ThreadError> {
    check_pairs(graph, pairs, reference_event)?;
    for &(x, y) in pairs {
        let cap_x = reference_cap(graph, x, reference_event);
        let cap_y = reference_cap(graph, y, reference_event);
        graph.link_caps(cap_x, cap_y)?;
    }
    Ok(pairs.len())
}

/// The group an imported end should join: the group of the end it is
/// adjacent to on the reference thread
fn adjacent_group(graph: &GenomeGraph, end: EndId) -> Result<GroupId, ThreadError> {
    let caps = &graph.end(end).caps;
    let [cap] = caps.as_slice() else {
        return Err(ThreadError::precondition(format!(
            "Imported {end} has {} caps, expected exactly one",
            caps.len()
        )));
    };
    let adjacent = graph.cap(*cap).adjacency.ok_or_else(|| {
        ThreadError::precondition(format!("Imported {end} has no reference adjacency"))
    })?;
    let partner = graph.cap(adjacent).end;
    graph.end(partner).group.ok_or_else(|| {
        ThreadError::precondition(format!(
            "{partner}, adjacent to imported {end}, has no group"
        ))
    })
}

/// Place each imported end in the group of its reference-adjacent end.
/// Every end is checked before any is moved.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` if an imported end lacks a
/// single adjacent cap or its partner has no group.
pub fn assign_groups(graph: &mut GenomeGraph, imported: &[EndId]) -> Result<(), ThreadError> {
    let targets = imported
        .iter()
        .map(|&end| Ok((end, adjacent_group(graph, end)?)))
        .collect::<Result<Vec<_>, ThreadError>>()?;
    for (end, group) in targets {
        graph.set_end_group(end, group)?;
    }
    Ok(())
}

/// Commit a flower's chosen matching.
///
/// Every end pair (chosen edges, link edges, imported pairs) and every
/// imported end is validated first; only then are bridge blocks built,
/// adjacencies linked and imported ends grouped.
///
/// # Errors
///
/// Returns `ThreadError::DuplicateResolution` or
/// `ThreadError::PreconditionViolation` before any mutation if the commit
/// cannot succeed.
pub fn commit(
    graph: &mut GenomeGraph,
    flower: FlowerId,
    nodes: &NodeMap,
    chosen: &[Edge],
    imported_pairs: &[EndPair],
    imported: &[EndId],
    reference_event: EventId,
) -> Result<Committed, ThreadError> {
    let chosen_pairs = resolve_edges(nodes, chosen)?;
    let mut link_pairs = Vec::new();
    let link_edges = append_link_edges(graph, flower, &mut link_pairs);

    let mut all: Vec<EndPair> = chosen_pairs.clone();
    all.extend_from_slice(&link_pairs);
    all.extend_from_slice(imported_pairs);
    check_pairs(graph, &all, reference_event)?;

    let paired: HashSet<EndId> = imported_pairs.iter().map(|&(new, _)| new).collect();
    for &(new, partner) in imported_pairs {
        if graph.end(partner).group.is_none() {
            return Err(ThreadError::precondition(format!(
                "{partner}, partner of imported {new}, has no group"
            )));
        }
    }
    if let Some(&end) = imported.iter().find(|e| !paired.contains(e)) {
        return Err(ThreadError::precondition(format!(
            "Imported {end} was not reached by any parent adjacency"
        )));
    }

    let (mut pairs, bridge_blocks) = add_bridge_blocks(graph, flower, chosen_pairs)?;
    pairs.extend(link_pairs);
    pairs.extend_from_slice(imported_pairs);
    let adjacencies = add_adjacencies_and_segments(graph, &pairs, reference_event)?;
    assign_groups(graph, imported)?;

    debug!(
        %flower,
        adjacencies,
        bridges = bridge_blocks.len(),
        link_edges,
        "Committed reference adjacencies"
    );
    Ok(Committed {
        bridge_blocks,
        link_edges,
        adjacencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;

    fn reference(graph: &mut GenomeGraph, flower: FlowerId) -> EventId {
        let tree = graph.flower(flower).event_tree;
        let root = graph.event_tree(tree).root;
        graph.add_event(tree, "reference", Some(root), f64::from(i32::MAX))
    }

    fn grouped_stub(graph: &mut GenomeGraph, flower: FlowerId, group: GroupId) -> EndId {
        let end = graph.add_stub_end(flower, true, Side::FivePrime);
        graph.set_end_group(end, group).unwrap();
        end
    }

    #[test]
    fn test_bridge_block_spans_groups() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let g1 = graph.add_tangle_group(flower);
        let g2 = graph.add_tangle_group(flower);
        let p = grouped_stub(&mut graph, flower, g1);
        let q = grouped_stub(&mut graph, flower, g1);
        let r = grouped_stub(&mut graph, flower, g2);
        let s = grouped_stub(&mut graph, flower, g2);

        let (pairs, blocks) =
            add_bridge_blocks(&mut graph, flower, vec![(q, r), (p, s)]).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(graph.group(g1).ends.len(), 4);
        assert_eq!(graph.group(g2).ends.len(), 4);

        let bridge = graph.block(blocks[0]);
        assert_eq!(graph.end(bridge.five_end).group, Some(g1));
        assert_eq!(graph.end(bridge.three_end).group, Some(g2));
        assert_eq!(pairs[0], (q, bridge.five_end));
        assert_eq!(pairs[1], (bridge.three_end, r));
    }

    #[test]
    fn test_block_end_gets_reference_segment() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let event = reference(&mut graph, flower);
        let group = graph.add_tangle_group(flower);
        let stub = grouped_stub(&mut graph, flower, group);
        let block = graph.add_block(flower, 4);
        let five = graph.block(block).five_end;

        add_adjacencies_and_segments(&mut graph, &[(stub, five)], event).unwrap();

        assert_eq!(graph.block(block).segments.len(), 1);
        let name = graph.event(event).name;
        let stub_cap = graph.cap_with_event(stub, name).unwrap();
        let five_cap = graph.cap_with_event(five, name).unwrap();
        assert_eq!(graph.cap(stub_cap).adjacency, Some(five_cap));
        assert!(graph.cap(stub_cap).segment.is_none());
        assert!(graph.cap(five_cap).segment.is_some());
    }

    #[test]
    fn test_second_reference_adjacency_is_rejected_without_mutation() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let event = reference(&mut graph, flower);
        let group = graph.add_tangle_group(flower);
        let ends: Vec<_> = (0..4).map(|_| grouped_stub(&mut graph, flower, group)).collect();

        add_adjacencies_and_segments(&mut graph, &[(ends[0], ends[1])], event).unwrap();
        let caps_before: usize = ends.iter().map(|&e| graph.end(e).caps.len()).sum();

        let pairs = [(ends[2], ends[3]), (ends[1], ends[2])];
        let result = add_adjacencies_and_segments(&mut graph, &pairs, event);
        assert!(matches!(result, Err(ThreadError::DuplicateResolution(_))));
        let caps_after: usize = ends.iter().map(|&e| graph.end(e).caps.len()).sum();
        assert_eq!(caps_before, caps_after);
    }

    #[test]
    fn test_link_edges_appended_unchanged() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let b1 = graph.add_block(flower, 10);
        let b2 = graph.add_block(flower, 10);
        let gap = (graph.block(b1).three_end, graph.block(b2).five_end);
        graph.add_chain(flower, &[gap]).unwrap();

        let mut pairs = Vec::new();
        assert_eq!(append_link_edges(&graph, flower, &mut pairs), 1);
        assert_eq!(pairs, vec![gap]);
    }

    #[test]
    fn test_imported_end_joins_partner_group() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let event = reference(&mut graph, flower);
        let group = graph.add_tangle_group(flower);
        let partner = grouped_stub(&mut graph, flower, group);
        let imported = graph.add_stub_end(flower, true, Side::ThreePrime);

        add_adjacencies_and_segments(&mut graph, &[(imported, partner)], event).unwrap();
        assign_groups(&mut graph, &[imported]).unwrap();
        assert_eq!(graph.end(imported).group, Some(group));
    }

    #[test]
    fn test_imported_end_without_adjacency_is_rejected() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let imported = graph.add_stub_end(flower, true, Side::ThreePrime);
        assert!(matches!(
            assign_groups(&mut graph, &[imported]),
            Err(ThreadError::PreconditionViolation(_))
        ));
    }
}
