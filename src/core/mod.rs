//! Nested alignment graph model.
//!
//! A [`GenomeGraph`] is an arena holding every object of one hierarchy of
//! flowers. Objects refer to each other through small `Copy` handles
//! ([`FlowerId`], [`EndId`], [`CapId`], ...), which keeps the naturally cyclic
//! relations (flower ↔ group ↔ end ↔ block ↔ cap) navigable in O(1) without
//! shared ownership.
//!
//! | Object  | Owns                               | Refers to              |
//! |---------|------------------------------------|------------------------|
//! | Flower  | ends, blocks, groups, chains, tree | parent group           |
//! | Group   | member ends                        | flower, nested flower  |
//! | End     | caps                               | flower, group, block   |
//! | Block   | two ends, segments                 | flower                 |
//! | Cap     |                                    | end, event, adjacency  |
//! | Chain   | links (one link group each)        | flower                 |
//!
//! Ends and events carry a [`Name`] shared by their copies at every level of
//! the hierarchy; a child flower's end is found from a parent end by name.

pub mod end;
pub mod event;
pub mod graph;
pub mod types;

pub use end::{Block, Cap, End, EndKind, Segment};
pub use event::{Event, EventTree};
pub use graph::{
    Chain, Flower, GenomeGraph, GraphError, GraphSnapshot, Group, GroupKind, Link,
    ROOT_EVENT_HEADER, SNAPSHOT_VERSION,
};
pub use types::{
    BlockId, CapId, ChainId, EndId, EventId, EventTreeId, FlowerId, GroupId, LinkId, Name,
    SegmentId, Side,
};
