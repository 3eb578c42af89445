//! Topology normalization run before a flower is mapped to a matching problem.

use tracing::debug;

use crate::core::{BlockId, EndId, FlowerId, GenomeGraph};
use crate::threading::ThreadError;

/// Length given to blocks fabricated by the threading pipeline
pub const FABRICATED_BLOCK_LENGTH: u64 = 1;

/// Copy into `flower` every attached stub or block end of its parent group
/// that the flower does not have yet.
///
/// Copies are attached stubs with the parent end's name and side, no caps
/// and no group; they are returned so the materializer can place them once
/// their reference adjacency is known.
///
/// # Errors
///
/// Returns `ThreadError::PreconditionViolation` if, after the import, the
/// flower's attached-stub count is odd or zero.
pub fn import_parent_stubs(
    graph: &mut GenomeGraph,
    flower: FlowerId,
) -> Result<Vec<EndId>, ThreadError> {
    let mut imported = Vec::new();
    if let Some(parent_group) = graph.parent_group(flower) {
        let candidates: Vec<EndId> = graph
            .group(parent_group)
            .ends
            .iter()
            .copied()
            .filter(|&end| {
                let record = graph.end(end);
                record.is_attached_stub() || record.is_block_end()
            })
            .collect();

        for parent_end in candidates {
            let name = graph.end(parent_end).name;
            if graph.end_by_name(flower, name).is_none() {
                imported.push(graph.copy_end_into(parent_end, flower));
            }
        }
    }

    let attached = graph.attached_stub_count(flower);
    if attached == 0 || attached % 2 != 0 {
        return Err(ThreadError::precondition(format!(
            "{flower} has {attached} attached stub ends, expected an even, nonzero count"
        )));
    }

    debug!(%flower, imported = imported.len(), attached, "Imported parent stubs");
    Ok(imported)
}

/// Add a fresh block to every tangle group holding a single end, with both
/// block ends joining that group.
///
/// The new block keeps the group matchable without linking it to a
/// neighbouring group. Groups that already have two or more ends are left
/// alone, so a second run creates nothing.
///
/// # Errors
///
/// Propagates graph errors from moving the new ends into the group.
pub fn break_single_end_groups(
    graph: &mut GenomeGraph,
    flower: FlowerId,
) -> Result<Vec<BlockId>, ThreadError> {
    let lonely: Vec<_> = graph
        .flower(flower)
        .groups
        .iter()
        .copied()
        .filter(|&g| {
            let group = graph.group(g);
            group.is_tangle() && group.ends.len() == 1
        })
        .collect();

    let mut blocks = Vec::with_capacity(lonely.len());
    for group in lonely {
        let block = graph.add_block(flower, FABRICATED_BLOCK_LENGTH);
        let (five_end, three_end) = {
            let record = graph.block(block);
            (record.five_end, record.three_end)
        };
        graph.set_end_group(five_end, group)?;
        graph.set_end_group(three_end, group)?;
        blocks.push(block);
    }

    if !blocks.is_empty() {
        debug!(%flower, blocks = blocks.len(), "Broke single-end groups");
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;

    #[test]
    fn test_single_end_group_gets_block() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let group = graph.add_tangle_group(flower);
        let end = graph.add_stub_end(flower, true, Side::FivePrime);
        graph.set_end_group(end, group).unwrap();

        let blocks = break_single_end_groups(&mut graph, flower).unwrap();
        assert_eq!(blocks.len(), 1);

        let block = graph.block(blocks[0]);
        assert_eq!(block.length, FABRICATED_BLOCK_LENGTH);
        assert_eq!(
            graph.group(group).ends,
            vec![end, block.five_end, block.three_end]
        );
    }

    #[test]
    fn test_break_is_idempotent() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let group = graph.add_tangle_group(flower);
        let end = graph.add_stub_end(flower, true, Side::FivePrime);
        graph.set_end_group(end, group).unwrap();

        break_single_end_groups(&mut graph, flower).unwrap();
        let ends_before = graph.flower(flower).ends.len();
        assert!(break_single_end_groups(&mut graph, flower).unwrap().is_empty());
        assert_eq!(graph.flower(flower).ends.len(), ends_before);
    }

    #[test]
    fn test_root_needs_attached_stubs() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        graph.add_stub_end(flower, false, Side::FivePrime);

        let result = import_parent_stubs(&mut graph, flower);
        assert!(matches!(result, Err(ThreadError::PreconditionViolation(_))));
    }

    #[test]
    fn test_import_copies_missing_parent_ends() {
        let mut graph = GenomeGraph::new();
        let root = graph.add_root_flower();
        let group = graph.add_tangle_group(root);
        let a = graph.add_stub_end(root, true, Side::FivePrime);
        let b = graph.add_stub_end(root, true, Side::ThreePrime);
        let free = graph.add_stub_end(root, false, Side::FivePrime);
        for end in [a, b, free] {
            graph.set_end_group(end, group).unwrap();
        }
        let child = graph.add_nested_flower(group).unwrap();
        let a_name = graph.end(a).name;
        graph.add_stub_end_named(child, a_name, true, Side::FivePrime);

        let imported = import_parent_stubs(&mut graph, child).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(graph.end(imported[0]).name, graph.end(b).name);
        assert!(graph.end(imported[0]).group.is_none());

        // Everything present now
        assert!(import_parent_stubs(&mut graph, child).unwrap().is_empty());
    }
}
