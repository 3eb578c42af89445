use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::core::end::{Block, Cap, End, Segment};
use crate::core::event::{Event, EventTree};
use crate::core::types::{
    BlockId, CapId, ChainId, EndId, EventId, EventTreeId, FlowerId, GroupId, LinkId, Name,
    SegmentId,
};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read graph snapshot: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse graph snapshot: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Cap {0} already carries an adjacency")]
    CapAlreadyAdjacent(CapId),

    #[error("Caps {0} and {1} belong to different events")]
    EventMismatch(CapId, CapId),

    #[error("Group {group} does not belong to flower {flower}")]
    ForeignGroup { group: GroupId, flower: FlowerId },

    #[error("Group {0} already has a nested flower")]
    NestedFlowerExists(GroupId),

    #[error("A chain needs at least one link")]
    EmptyChain,

    #[error("Snapshot refers to {kind} #{index}, but only {len} exist")]
    DanglingHandle {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Flower {0} is nested inside itself")]
    NestingCycle(FlowerId),
}

fn check_handle(kind: &'static str, index: usize, len: usize) -> Result<(), GraphError> {
    if index < len {
        Ok(())
    } else {
        Err(GraphError::DanglingHandle { kind, index, len })
    }
}

/// Snapshot version for compatibility checking
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Header used for the root event of every event tree
pub const ROOT_EVENT_HEADER: &str = "ROOT";

/// One level of the alignment hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flower {
    /// Group of the parent flower this flower is nested in (`None` at the root)
    pub parent_group: Option<GroupId>,

    /// Ends in creation order
    pub ends: Vec<EndId>,

    pub blocks: Vec<BlockId>,
    pub groups: Vec<GroupId>,
    pub chains: Vec<ChainId>,
    pub event_tree: EventTreeId,

    /// Index: end name -> end
    #[serde(skip)]
    pub(crate) end_index: HashMap<Name, EndId>,
}

/// Whether a group's internal adjacencies are still open or already resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    /// Adjacencies unresolved, subject to matching
    Tangle,
    /// Resolved as one link of a chain
    Link(LinkId),
}

/// A partition of a flower's ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub flower: FlowerId,
    pub kind: GroupKind,
    pub ends: Vec<EndId>,

    /// Flower one level down that refines this group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<FlowerId>,
}

impl Group {
    #[must_use]
    pub fn is_tangle(&self) -> bool {
        matches!(self.kind, GroupKind::Tangle)
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self.kind, GroupKind::Link(_))
    }
}

/// An ordered, non-branching run of links
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub flower: FlowerId,
    pub links: Vec<LinkId>,
}

/// One resolved adjacency of a chain: the ends on either side of the gap
/// between two consecutive blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub chain: ChainId,
    pub group: GroupId,
    /// End on the 5' side of the link
    pub five_end: EndId,
    /// End on the 3' side of the link
    pub three_end: EndId,
}

/// Serializable snapshot format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: String,
    pub created_at: String,
    pub graph: GenomeGraph,
}

/// Arena holding every object of a nested alignment graph.
///
/// Objects refer to each other through `Copy` handles, so the cyclic
/// flower/group/end/block/cap relations need no shared ownership. Nothing is
/// ever removed from the arena; handles stay valid for the life of the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenomeGraph {
    pub(crate) flowers: Vec<Flower>,
    pub(crate) groups: Vec<Group>,
    pub(crate) ends: Vec<End>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) caps: Vec<Cap>,
    pub(crate) chains: Vec<Chain>,
    pub(crate) links: Vec<Link>,
    pub(crate) events: Vec<Event>,
    pub(crate) event_trees: Vec<EventTree>,
    next_name: u64,
}

impl GenomeGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a name not used by any end or event of this graph
    pub fn fresh_name(&mut self) -> Name {
        self.next_name += 1;
        Name(self.next_name)
    }

    pub(crate) fn reserve_name(&mut self, name: Name) {
        self.next_name = self.next_name.max(name.0);
    }

    // === Accessors ===

    #[must_use]
    pub fn flower(&self, id: FlowerId) -> &Flower {
        &self.flowers[id.0]
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    #[must_use]
    pub fn chain(&self, id: ChainId) -> &Chain {
        &self.chains[id.0]
    }

    #[must_use]
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    #[must_use]
    pub fn flower_count(&self) -> usize {
        self.flowers.len()
    }

    pub fn flower_ids(&self) -> impl Iterator<Item = FlowerId> {
        (0..self.flowers.len()).map(FlowerId)
    }

    // === Flowers ===

    /// Create a flower at the top of a new hierarchy, with its own event tree
    pub fn add_root_flower(&mut self) -> FlowerId {
        let tree = self.add_event_tree();
        self.push_flower(None, tree)
    }

    /// Create the flower nested in `group`. Its event tree starts as a copy
    /// of the parent flower's tree, so events keep their names across levels.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NestedFlowerExists` if the group already has one.
    pub fn add_nested_flower(&mut self, group: GroupId) -> Result<FlowerId, GraphError> {
        if self.groups[group.0].nested.is_some() {
            return Err(GraphError::NestedFlowerExists(group));
        }
        let parent_tree = self.flower(self.group(group).flower).event_tree;
        let tree = self.copy_event_tree(parent_tree);
        let flower = self.push_flower(Some(group), tree);
        self.groups[group.0].nested = Some(flower);
        Ok(flower)
    }

    fn push_flower(&mut self, parent_group: Option<GroupId>, event_tree: EventTreeId) -> FlowerId {
        let id = FlowerId(self.flowers.len());
        self.flowers.push(Flower {
            parent_group,
            ends: Vec::new(),
            blocks: Vec::new(),
            groups: Vec::new(),
            chains: Vec::new(),
            event_tree,
            end_index: HashMap::new(),
        });
        id
    }

    #[must_use]
    pub fn parent_group(&self, flower: FlowerId) -> Option<GroupId> {
        self.flower(flower).parent_group
    }

    #[must_use]
    pub fn parent_flower(&self, flower: FlowerId) -> Option<FlowerId> {
        self.parent_group(flower).map(|g| self.group(g).flower)
    }

    /// Look up the end of `flower` carrying `name`
    #[must_use]
    pub fn end_by_name(&self, flower: FlowerId, name: Name) -> Option<EndId> {
        self.flower(flower).end_index.get(&name).copied()
    }

    /// Number of attached stub ends in the flower
    #[must_use]
    pub fn attached_stub_count(&self, flower: FlowerId) -> usize {
        self.flower(flower)
            .ends
            .iter()
            .filter(|&&end| self.end(end).is_attached_stub())
            .count()
    }

    // === Groups ===

    /// Create an empty tangle group
    pub fn add_tangle_group(&mut self, flower: FlowerId) -> GroupId {
        self.push_group(flower, GroupKind::Tangle)
    }

    fn push_group(&mut self, flower: FlowerId, kind: GroupKind) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            flower,
            kind,
            ends: Vec::new(),
            nested: None,
        });
        self.flowers[flower.0].groups.push(id);
        id
    }

    /// Move `end` into `group`, removing it from its previous group
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ForeignGroup` if the group lives in another flower.
    pub fn set_end_group(&mut self, end: EndId, group: GroupId) -> Result<(), GraphError> {
        let flower = self.end(end).flower;
        if self.group(group).flower != flower {
            return Err(GraphError::ForeignGroup { group, flower });
        }
        if let Some(previous) = self.ends[end.0].group {
            if previous == group {
                return Ok(());
            }
            self.groups[previous.0].ends.retain(|&e| e != end);
        }
        self.ends[end.0].group = Some(group);
        self.groups[group.0].ends.push(end);
        Ok(())
    }

    // === Chains ===

    /// Create a chain from `(five_end, three_end)` pairs, one link group per pair
    ///
    /// # Errors
    ///
    /// Returns `GraphError::EmptyChain` for an empty slice, or
    /// `GraphError::ForeignGroup` if an end lives in another flower.
    pub fn add_chain(
        &mut self,
        flower: FlowerId,
        links: &[(EndId, EndId)],
    ) -> Result<ChainId, GraphError> {
        if links.is_empty() {
            return Err(GraphError::EmptyChain);
        }
        let chain = ChainId(self.chains.len());
        self.chains.push(Chain {
            flower,
            links: Vec::with_capacity(links.len()),
        });
        self.flowers[flower.0].chains.push(chain);

        for &(five_end, three_end) in links {
            let link = LinkId(self.links.len());
            let group = self.push_group(flower, GroupKind::Link(link));
            self.links.push(Link {
                chain,
                group,
                five_end,
                three_end,
            });
            self.chains[chain.0].links.push(link);
            self.set_end_group(five_end, group)?;
            self.set_end_group(three_end, group)?;
        }
        Ok(chain)
    }

    // === Snapshots ===

    /// Rebuild the lookup indexes that are not serialized
    pub fn rebuild_indexes(&mut self) {
        for flower in &mut self.flowers {
            flower.end_index.clear();
        }
        let mut max_name = 0;
        for (i, end) in self.ends.iter().enumerate() {
            self.flowers[end.flower.0].end_index.insert(end.name, EndId(i));
            max_name = max_name.max(end.name.0);
        }
        for event in &self.events {
            max_name = max_name.max(event.name.0);
        }
        self.next_name = self.next_name.max(max_name);
    }

    /// Check that every handle stored in the arena points at an existing
    /// record and that no flower is nested inside itself
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DanglingHandle` for the first out-of-range handle,
    /// or `GraphError::NestingCycle` for a flower reachable from its own
    /// parent chain.
    pub fn validate_handles(&self) -> Result<(), GraphError> {
        let flower = |id: FlowerId| check_handle("flower", id.0, self.flowers.len());
        let group = |id: GroupId| check_handle("group", id.0, self.groups.len());
        let end = |id: EndId| check_handle("end", id.0, self.ends.len());
        let block = |id: BlockId| check_handle("block", id.0, self.blocks.len());
        let segment = |id: SegmentId| check_handle("segment", id.0, self.segments.len());
        let cap = |id: CapId| check_handle("cap", id.0, self.caps.len());
        let chain = |id: ChainId| check_handle("chain", id.0, self.chains.len());
        let link = |id: LinkId| check_handle("link", id.0, self.links.len());
        let event = |id: EventId| check_handle("event", id.0, self.events.len());
        let tree = |id: EventTreeId| check_handle("event tree", id.0, self.event_trees.len());

        for record in &self.flowers {
            record.parent_group.map_or(Ok(()), group)?;
            record.ends.iter().try_for_each(|&e| end(e))?;
            record.blocks.iter().try_for_each(|&b| block(b))?;
            record.groups.iter().try_for_each(|&g| group(g))?;
            record.chains.iter().try_for_each(|&c| chain(c))?;
            tree(record.event_tree)?;
        }
        for record in &self.groups {
            flower(record.flower)?;
            if let GroupKind::Link(id) = record.kind {
                link(id)?;
            }
            record.ends.iter().try_for_each(|&e| end(e))?;
            record.nested.map_or(Ok(()), flower)?;
        }
        for record in &self.chains {
            flower(record.flower)?;
            record.links.iter().try_for_each(|&l| link(l))?;
        }
        for record in &self.links {
            chain(record.chain)?;
            group(record.group)?;
            end(record.five_end)?;
            end(record.three_end)?;
        }
        for record in &self.ends {
            flower(record.flower)?;
            record.block().map_or(Ok(()), block)?;
            record.group.map_or(Ok(()), group)?;
            record.caps.iter().try_for_each(|&c| cap(c))?;
        }
        for record in &self.blocks {
            flower(record.flower)?;
            end(record.five_end)?;
            end(record.three_end)?;
            record.segments.iter().try_for_each(|&s| segment(s))?;
        }
        for record in &self.segments {
            block(record.block)?;
            event(record.event)?;
            cap(record.five_cap)?;
            cap(record.three_cap)?;
        }
        for record in &self.caps {
            end(record.end)?;
            event(record.event)?;
            record.segment.map_or(Ok(()), segment)?;
            record.adjacency.map_or(Ok(()), cap)?;
        }
        for record in &self.events {
            record.parent.map_or(Ok(()), event)?;
            tree(record.tree)?;
        }
        for record in &self.event_trees {
            event(record.root)?;
            record.events.iter().try_for_each(|&e| event(e))?;
        }

        // A parent chain longer than the number of flowers must repeat one
        for start in self.flower_ids() {
            let mut current = start;
            for _ in 0..self.flowers.len() {
                match self.parent_flower(current) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            if self.parent_flower(current).is_some() {
                return Err(GraphError::NestingCycle(start));
            }
        }
        Ok(())
    }

    /// Parse a graph from snapshot JSON
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ParseError` if the JSON is invalid, or
    /// `GraphError::DanglingHandle` / `GraphError::NestingCycle` if it
    /// describes an inconsistent arena.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                expected = SNAPSHOT_VERSION,
                found = %snapshot.version,
                "Snapshot version mismatch"
            );
        }

        let mut graph = snapshot.graph;
        graph.validate_handles()?;
        graph.rebuild_indexes();
        Ok(graph)
    }

    /// Load a graph from a JSON snapshot file, gzip-compressed when the path
    /// ends in `.gz`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let is_gzipped = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("gz"));

        let content = if is_gzipped {
            let file = std::fs::File::open(path)?;
            let mut decoder = flate2::read::GzDecoder::new(file);
            let mut content = String::new();
            decoder.read_to_string(&mut content)?;
            content
        } else {
            std::fs::read_to_string(path)?
        };

        Self::from_json(&content)
    }

    /// Serialize the graph as snapshot JSON
    ///
    /// # Errors
    ///
    /// Returns `GraphError::ParseError` if serialization fails.
    pub fn to_json(&self) -> Result<String, GraphError> {
        let snapshot = GraphSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            graph: self.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Save the graph as a JSON snapshot file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    // === Internal record access for the other core modules ===

    pub(crate) fn push_end(&mut self, end: End) -> EndId {
        let id = EndId(self.ends.len());
        let flower = end.flower;
        let name = end.name;
        self.reserve_name(name);
        self.ends.push(end);
        let record = &mut self.flowers[flower.0];
        record.ends.push(id);
        record.end_index.insert(name, id);
        id
    }

    pub(crate) fn push_block(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.flowers[block.flower.0].blocks.push(id);
        self.blocks.push(block);
        id
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) -> SegmentId {
        let id = SegmentId(self.segments.len());
        self.blocks[segment.block.0].segments.push(id);
        self.segments.push(segment);
        id
    }

    pub(crate) fn push_cap(&mut self, cap: Cap) -> CapId {
        let id = CapId(self.caps.len());
        self.ends[cap.end.0].caps.push(id);
        self.caps.push(cap);
        id
    }
}
