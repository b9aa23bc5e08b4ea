//! Selection set for nodes and edges.

use hsk_core::{Document, EdgeId, NodeId};
use std::collections::HashSet;

/// Anything that can be selected on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selectable {
    Node(NodeId),
    Edge(EdgeId),
}

#[derive(Debug, Default, Clone)]
pub struct Selection {
    selected: HashSet<Selectable>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Click on an item: Shift toggles it, a plain click makes it the only
    /// selected item. A plain click on an already selected item keeps the
    /// selection so the group can be dragged.
    pub fn handle_interaction(&mut self, item: Selectable, shift_held: bool) {
        if shift_held {
            if !self.selected.remove(&item) {
                self.selected.insert(item);
            }
        } else if !self.selected.contains(&item) {
            self.selected.clear();
            self.selected.insert(item);
        }
    }

    pub fn insert(&mut self, item: Selectable) {
        self.selected.insert(item);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Replace the current selection, e.g. after a rubber-band drag.
    pub fn replace<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = Selectable>,
    {
        self.selected.clear();
        self.selected.extend(items);
    }

    /// Select every node and edge of `doc`.
    pub fn select_all(&mut self, doc: &Document) {
        self.replace(
            doc.node_ids()
                .into_iter()
                .map(Selectable::Node)
                .chain(doc.edge_ids().into_iter().map(Selectable::Edge)),
        );
    }

    pub fn contains(&self, item: Selectable) -> bool {
        self.selected.contains(&item)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.contains(Selectable::Node(id))
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.contains(Selectable::Edge(id))
    }

    /// Selected nodes, in document order.
    pub fn nodes(&self, doc: &Document) -> Vec<NodeId> {
        doc.node_ids()
            .into_iter()
            .filter(|id| self.contains_node(*id))
            .collect()
    }

    /// Selected edges, in document order.
    pub fn edges(&self, doc: &Document) -> Vec<EdgeId> {
        doc.edge_ids()
            .into_iter()
            .filter(|id| self.contains_edge(*id))
            .collect()
    }

    /// Forget items that no longer exist in `doc` (after delete, undo, load).
    pub fn retain_existing(&mut self, doc: &Document) {
        self.selected.retain(|item| match item {
            Selectable::Node(id) => doc.contains_node(*id),
            Selectable::Edge(id) => doc.contains_edge(*id),
        });
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
