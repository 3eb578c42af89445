use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::graph::{GenomeGraph, ROOT_EVENT_HEADER};
use crate::core::types::{EventId, EventTreeId, Name};

/// A node of a flower's phylogenetic event tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Identity shared with the same event at other hierarchy levels
    pub name: Name,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<EventId>,
    pub branch_length: f64,
    pub tree: EventTreeId,
}

/// The events visible in one flower, rooted at a synthetic root event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTree {
    pub root: EventId,
    pub events: Vec<EventId>,
}

impl GenomeGraph {
    #[must_use]
    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.0]
    }

    #[must_use]
    pub fn event_tree(&self, id: EventTreeId) -> &EventTree {
        &self.event_trees[id.0]
    }

    pub(crate) fn add_event_tree(&mut self) -> EventTreeId {
        let tree = EventTreeId(self.event_trees.len());
        let root = EventId(self.events.len());
        let name = self.fresh_name();
        self.events.push(Event {
            name,
            header: ROOT_EVENT_HEADER.to_string(),
            parent: None,
            branch_length: 0.0,
            tree,
        });
        self.event_trees.push(EventTree {
            root,
            events: vec![root],
        });
        tree
    }

    /// Copy every event of `source` into a new tree, keeping names and
    /// parent relations
    pub(crate) fn copy_event_tree(&mut self, source: EventTreeId) -> EventTreeId {
        let tree = EventTreeId(self.event_trees.len());
        let originals = self.event_tree(source).events.clone();
        let mut remap: HashMap<EventId, EventId> = HashMap::with_capacity(originals.len());

        for &original in &originals {
            let copy = EventId(self.events.len() + remap.len());
            remap.insert(original, copy);
        }
        for &original in &originals {
            let record = self.event(original);
            let event = Event {
                name: record.name,
                header: record.header.clone(),
                parent: record.parent.and_then(|p| remap.get(&p).copied()),
                branch_length: record.branch_length,
                tree,
            };
            self.events.push(event);
        }

        let root = remap[&self.event_tree(source).root];
        self.event_trees.push(EventTree {
            root,
            events: originals.iter().map(|e| remap[e]).collect(),
        });
        tree
    }

    /// Add an event with a fresh name to `tree`
    pub fn add_event(
        &mut self,
        tree: EventTreeId,
        header: &str,
        parent: Option<EventId>,
        branch_length: f64,
    ) -> EventId {
        let name = self.fresh_name();
        self.add_event_named(tree, name, header, parent, branch_length)
    }

    /// Add an event that shares its name with an event at another level
    pub fn add_event_named(
        &mut self,
        tree: EventTreeId,
        name: Name,
        header: &str,
        parent: Option<EventId>,
        branch_length: f64,
    ) -> EventId {
        let id = EventId(self.events.len());
        self.reserve_name(name);
        self.events.push(Event {
            name,
            header: header.to_string(),
            parent,
            branch_length,
            tree,
        });
        self.event_trees[tree.0].events.push(id);
        id
    }

    /// Find the event of `tree` with the given header
    #[must_use]
    pub fn event_by_header(&self, tree: EventTreeId, header: &str) -> Option<EventId> {
        self.event_tree(tree)
            .events
            .iter()
            .copied()
            .find(|&e| self.event(e).header == header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_event_created_with_tree() {
        let mut graph = GenomeGraph::new();
        let flower = graph.add_root_flower();
        let tree = graph.flower(flower).event_tree;

        let root = graph.event_tree(tree).root;
        assert_eq!(graph.event(root).header, ROOT_EVENT_HEADER);
        assert_eq!(graph.event_by_header(tree, ROOT_EVENT_HEADER), Some(root));
        assert_eq!(graph.event_by_header(tree, "missing"), None);
    }

    #[test]
    fn test_nested_tree_copies_names_and_parents() {
        let mut graph = GenomeGraph::new();
        let root_flower = graph.add_root_flower();
        let tree = graph.flower(root_flower).event_tree;
        let root = graph.event_tree(tree).root;
        let human = graph.add_event(tree, "human", Some(root), 0.5);

        let group = graph.add_tangle_group(root_flower);
        let child = graph.add_nested_flower(group).unwrap();
        let child_tree = graph.flower(child).event_tree;
        assert_ne!(child_tree, tree);

        let child_human = graph.event_by_header(child_tree, "human").unwrap();
        assert_ne!(child_human, human);
        assert_eq!(graph.event(child_human).name, graph.event(human).name);
        assert_eq!(graph.event(child_human).parent, Some(graph.event_tree(child_tree).root));
        assert!((graph.event(child_human).branch_length - 0.5).abs() < f64::EPSILON);
    }
}
