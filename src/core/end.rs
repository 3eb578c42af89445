use serde::{Deserialize, Serialize};

use crate::core::graph::{GenomeGraph, GraphError};
use crate::core::types::{BlockId, CapId, EndId, EventId, FlowerId, GroupId, Name, SegmentId, Side};

/// What an end terminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndKind {
    /// Boundary of unaligned sequence; attached stubs carry over from the
    /// parent level, free stubs do not
    Stub { attached: bool },
    /// One side of an aligned block
    Block(BlockId),
}

/// A directed connection point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct End {
    pub name: Name,
    pub flower: FlowerId,
    pub kind: EndKind,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caps: Vec<CapId>,
}

impl End {
    #[must_use]
    pub fn is_block_end(&self) -> bool {
        matches!(self.kind, EndKind::Block(_))
    }

    #[must_use]
    pub fn is_stub_end(&self) -> bool {
        matches!(self.kind, EndKind::Stub { .. })
    }

    #[must_use]
    pub fn is_attached_stub(&self) -> bool {
        matches!(self.kind, EndKind::Stub { attached: true })
    }

    #[must_use]
    pub fn block(&self) -> Option<BlockId> {
        match self.kind {
            EndKind::Block(block) => Some(block),
            EndKind::Stub { .. } => None,
        }
    }
}

/// An aligned column with a 5' and a 3' end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub flower: FlowerId,
    pub length: u64,
    pub five_end: EndId,
    pub three_end: EndId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<SegmentId>,
}

/// One event's instance of a block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub block: BlockId,
    pub event: EventId,
    pub five_cap: CapId,
    pub three_cap: CapId,
}

/// One event's instance of an end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cap {
    pub end: EndId,
    pub event: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<SegmentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacency: Option<CapId>,
}

impl GenomeGraph {
    #[must_use]
    pub fn end(&self, id: EndId) -> &End {
        &self.ends[id.0]
    }

    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    #[must_use]
    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    #[must_use]
    pub fn cap(&self, id: CapId) -> &Cap {
        &self.caps[id.0]
    }

    /// Create a stub end with a fresh name
    pub fn add_stub_end(&mut self, flower: FlowerId, attached: bool, side: Side) -> EndId {
        let name = self.fresh_name();
        self.add_stub_end_named(flower, name, attached, side)
    }

    /// Create a stub end carrying an existing name, e.g. the counterpart of a
    /// parent-level end
    pub fn add_stub_end_named(
        &mut self,
        flower: FlowerId,
        name: Name,
        attached: bool,
        side: Side,
    ) -> EndId {
        self.push_end(End {
            name,
            flower,
            kind: EndKind::Stub { attached },
            side,
            group: None,
            caps: Vec::new(),
        })
    }

    /// Create a block with two fresh, ungrouped ends
    pub fn add_block(&mut self, flower: FlowerId, length: u64) -> BlockId {
        let block = BlockId(self.blocks.len());
        let ends = [Side::FivePrime, Side::ThreePrime].map(|side| {
            let name = self.fresh_name();
            self.push_end(End {
                name,
                flower,
                kind: EndKind::Block(block),
                side,
                group: None,
                caps: Vec::new(),
            })
        });
        let id = self.push_block(Block {
            flower,
            length,
            five_end: ends[0],
            three_end: ends[1],
            segments: Vec::new(),
        });
        debug_assert_eq!(id, block);
        id
    }

    /// Copy `end` into `flower` as an attached stub with the same name and
    /// side, no caps and no group
    pub fn copy_end_into(&mut self, end: EndId, flower: FlowerId) -> EndId {
        let source = self.end(end);
        let (name, side) = (source.name, source.side);
        self.add_stub_end_named(flower, name, true, side)
    }

    /// The opposite end of the block `end` belongs to
    #[must_use]
    pub fn other_block_end(&self, end: EndId) -> Option<EndId> {
        let block = self.block(self.end(end).block()?);
        Some(if block.five_end == end {
            block.three_end
        } else {
            block.five_end
        })
    }

    /// Create a bare cap on `end` for `event`
    pub fn add_cap(&mut self, end: EndId, event: EventId) -> CapId {
        self.push_cap(Cap {
            end,
            event,
            segment: None,
            adjacency: None,
        })
    }

    /// Create a segment of `block` for `event`, with a cap on each block end
    pub fn add_segment(&mut self, block: BlockId, event: EventId) -> SegmentId {
        let (five_end, three_end) = {
            let record = self.block(block);
            (record.five_end, record.three_end)
        };
        let five_cap = self.add_cap(five_end, event);
        let three_cap = self.add_cap(three_end, event);
        let segment = self.push_segment(Segment {
            block,
            event,
            five_cap,
            three_cap,
        });
        self.caps[five_cap.0].segment = Some(segment);
        self.caps[three_cap.0].segment = Some(segment);
        segment
    }

    /// First cap of `end` whose event carries `event_name`
    #[must_use]
    pub fn cap_with_event(&self, end: EndId, event_name: Name) -> Option<CapId> {
        self.end(end)
            .caps
            .iter()
            .copied()
            .find(|&cap| self.event(self.cap(cap).event).name == event_name)
    }

    /// Make two caps of the same event adjacent. An adjacency is never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::EventMismatch` if the caps belong to different
    /// events, or `GraphError::CapAlreadyAdjacent` if either is taken.
    pub fn link_caps(&mut self, a: CapId, b: CapId) -> Result<(), GraphError> {
        let event_a = self.event(self.cap(a).event).name;
        let event_b = self.event(self.cap(b).event).name;
        if event_a != event_b {
            return Err(GraphError::EventMismatch(a, b));
        }
        for cap in [a, b] {
            if self.cap(cap).adjacency.is_some() {
                return Err(GraphError::CapAlreadyAdjacent(cap));
            }
        }
        self.caps[a.0].adjacency = Some(b);
        self.caps[b.0].adjacency = Some(a);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_event() -> (GenomeGraph, FlowerId, EventId) {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let tree = graph.flower(flower).event_tree;
        let root = graph.event_tree(tree).root;
        let event = graph.add_event(tree, "human", Some(root), 1.0);
        (graph, flower, event)
    }

    #[test]
    fn test_add_block_creates_both_ends() {
        let (mut graph, flower, _) = graph_with_event();
        let block = graph.add_block(flower, 5);
        let five = graph.block(block).five_end;
        let three = graph.block(block).three_end;

        assert_eq!(graph.end(five).side, Side::FivePrime);
        assert_eq!(graph.end(three).side, Side::ThreePrime);
        assert_eq!(graph.other_block_end(five), Some(three));
        assert_eq!(graph.other_block_end(three), Some(five));
        assert_eq!(graph.flower(flower).blocks, vec![block]);
        assert_eq!(graph.end_by_name(flower, graph.end(five).name), Some(five));
    }

    #[test]
    fn test_segment_caps_both_ends() {
        let (mut graph, flower, event) = graph_with_event();
        let block = graph.add_block(flower, 5);
        let segment = graph.add_segment(block, event);
        let event_name = graph.event(event).name;

        let five_cap = graph.cap_with_event(graph.block(block).five_end, event_name);
        let three_cap = graph.cap_with_event(graph.block(block).three_end, event_name);
        assert_eq!(five_cap, Some(graph.segment(segment).five_cap));
        assert_eq!(three_cap, Some(graph.segment(segment).three_cap));
    }

    #[test]
    fn test_link_caps_never_overwrites() {
        let (mut graph, flower, event) = graph_with_event();
        let ends: Vec<_> = (0..3)
            .map(|_| graph.add_stub_end(flower, true, Side::FivePrime))
            .collect();
        let caps: Vec<_> = ends.iter().map(|&e| graph.add_cap(e, event)).collect();

        graph.link_caps(caps[0], caps[1]).unwrap();
        assert_eq!(graph.cap(caps[1]).adjacency, Some(caps[0]));

        let result = graph.link_caps(caps[2], caps[1]);
        assert!(matches!(result, Err(GraphError::CapAlreadyAdjacent(c)) if c == caps[1]));
        assert!(graph.cap(caps[2]).adjacency.is_none());
    }

    #[test]
    fn test_link_caps_rejects_mixed_events() {
        let (mut graph, flower, event) = graph_with_event();
        let tree = graph.flower(flower).event_tree;
        let other = graph.add_event(tree, "chimp", Some(event), 1.0);
        let a = graph.add_stub_end(flower, true, Side::FivePrime);
        let b = graph.add_stub_end(flower, true, Side::ThreePrime);
        let cap_a = graph.add_cap(a, event);
        let cap_b = graph.add_cap(b, other);

        assert!(matches!(
            graph.link_caps(cap_a, cap_b),
            Err(GraphError::EventMismatch(..))
        ));
    }

    #[test]
    fn test_copy_end_into_child() {
        let (mut graph, root, _) = graph_with_event();
        let group = graph.add_tangle_group(root);
        let block = graph.add_block(root, 3);
        let five = graph.block(block).five_end;
        graph.set_end_group(five, group).unwrap();
        let child = graph.add_nested_flower(group).unwrap();

        let copy = graph.copy_end_into(five, child);
        assert!(graph.end(copy).is_attached_stub());
        assert_eq!(graph.end(copy).name, graph.end(five).name);
        assert!(graph.end(copy).group.is_none());
        assert!(graph.end(copy).caps.is_empty());
    }
}
