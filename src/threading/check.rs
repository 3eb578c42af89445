//! Structural re-validation of a threaded flower.
//!
//! Run after every flower in debug builds; not part of the stable contract.

use crate::core::{EndId, EventId, FlowerId, GenomeGraph, Side};
use crate::threading::ThreadError;

fn fail(message: String) -> Result<(), ThreadError> {
    Err(ThreadError::PreconditionViolation(format!(
        "Structural check failed: {message}"
    )))
}

/// Re-validate the cross links of `flower` and its reference thread.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` describing the first broken
/// relation found.
pub fn check_flower(
    graph: &GenomeGraph,
    flower: FlowerId,
    reference_event: EventId,
) -> Result<(), ThreadError> {
    let record = graph.flower(flower);
    let reference_name = graph.event(reference_event).name;

    for &end in &record.ends {
        let e = graph.end(end);
        if e.flower != flower {
            return fail(format!("{end} is listed in {flower} but belongs to {}", e.flower));
        }
        if graph.end_by_name(flower, e.name) != Some(end) {
            return fail(format!("{end} is not indexed under its name {}", e.name));
        }
        if let Some(group) = e.group {
            if !graph.group(group).ends.contains(&end) {
                return fail(format!("{end} points at {group}, which does not list it"));
            }
        }
        check_caps(graph, end)?;
    }

    for &group in &record.groups {
        let g = graph.group(group);
        if g.flower != flower {
            return fail(format!("{group} is listed in {flower} but belongs to {}", g.flower));
        }
        if let Some(&stray) = g.ends.iter().find(|&&e| graph.end(e).group != Some(group)) {
            return fail(format!("{group} lists {stray}, which points elsewhere"));
        }
        if g.is_tangle() {
            if g.ends.len() < 2 {
                return fail(format!("Tangle {group} has {} ends", g.ends.len()));
            }
            for &end in &g.ends {
                let threaded = graph
                    .cap_with_event(end, reference_name)
                    .is_some_and(|cap| graph.cap(cap).adjacency.is_some());
                if !threaded {
                    return fail(format!("Tangle {end} is not on the reference thread"));
                }
            }
        }
    }

    for &block in &record.blocks {
        let b = graph.block(block);
        for (end, side) in [(b.five_end, Side::FivePrime), (b.three_end, Side::ThreePrime)] {
            let e = graph.end(end);
            if e.block() != Some(block) || e.side != side {
                return fail(format!("{block} and its {side} end {end} disagree"));
            }
        }
    }

    Ok(())
}

fn check_caps(graph: &GenomeGraph, end: EndId) -> Result<(), ThreadError> {
    for &cap in &graph.end(end).caps {
        let c = graph.cap(cap);
        if c.end != end {
            return fail(format!("{cap} is listed on {end} but belongs to {}", c.end));
        }
        if let Some(adjacent) = c.adjacency {
            let a = graph.cap(adjacent);
            if a.adjacency != Some(cap) {
                return fail(format!("Adjacency {cap} -> {adjacent} is not symmetric"));
            }
            if graph.event(a.event).name != graph.event(c.event).name {
                return fail(format!("{cap} and {adjacent} join different events"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unthreaded_tangle_fails() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let tree = graph.flower(flower).event_tree;
        let root = graph.event_tree(tree).root;
        let reference = graph.add_event(tree, "reference", Some(root), 1.0);
        let group = graph.add_tangle_group(flower);
        let ends: Vec<_> = (0..2)
            .map(|_| graph.add_stub_end(flower, true, Side::FivePrime))
            .collect();
        for &end in &ends {
            graph.set_end_group(end, group).unwrap();
        }

        assert!(check_flower(&graph, flower, reference).is_err());

        let a = graph.add_cap(ends[0], reference);
        let b = graph.add_cap(ends[1], reference);
        graph.link_caps(a, b).unwrap();
        assert!(check_flower(&graph, flower, reference).is_ok());
    }
}
