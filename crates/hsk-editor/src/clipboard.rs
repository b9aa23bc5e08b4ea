//! Copy / cut / paste of sub-graphs.
//!
//! A payload is a closed sub-graph: every edge it carries connects two
//! sockets of nodes that are also in the payload. Payloads are plain data
//! with no ties to the live document and travel as JSON text.

use crate::history::History;
use crate::selection::Selection;
use hsk_core::serializer::{self, EdgeData, NodeData, SocketMap};
use hsk_core::{Document, DocumentError, NodeId, Point, Result, SocketId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardData {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
}

impl ClipboardData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_text(&self) -> Result<String> {
        serializer::to_pretty_json(self)
    }

    pub fn from_text(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Centre of the bounding box of the recorded node positions.
    pub fn center(&self) -> Option<Point> {
        let first = self.nodes.first()?;
        let (mut min_x, mut min_y) = (first.pos_x, first.pos_y);
        let (mut max_x, mut max_y) = (first.pos_x, first.pos_y);
        for node in &self.nodes[1..] {
            min_x = min_x.min(node.pos_x);
            min_y = min_y.min(node.pos_y);
            max_x = max_x.max(node.pos_x);
            max_y = max_y.max(node.pos_y);
        }
        Some(Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0))
    }

    fn check_closed(&self) -> Result<()> {
        let sockets: HashSet<SocketId> = self
            .nodes
            .iter()
            .flat_map(|n| n.sockets.iter().map(|s| s.id))
            .collect();
        for edge in &self.edges {
            for socket in [edge.start, edge.end] {
                if !sockets.contains(&socket) {
                    return Err(DocumentError::DanglingReference {
                        edge: edge.id,
                        socket,
                    });
                }
            }
            if edge.start == edge.end {
                return Err(DocumentError::SelfConnection(edge.start));
            }
        }
        Ok(())
    }
}

/// Capture the selected nodes plus the selected edges whose both ends lie
/// on selected nodes. With `delete`, the whole selection is also removed
/// from `doc` as one undoable step.
pub fn serialize_selected(
    doc: &mut Document,
    selection: &mut Selection,
    history: &mut History,
    delete: bool,
) -> Result<ClipboardData> {
    let nodes = selection.nodes(doc);
    let edges = selection.edges(doc);

    let mut sockets: HashSet<SocketId> = HashSet::new();
    let mut data = ClipboardData::default();
    for id in &nodes {
        if let Some(node) = doc.node(*id) {
            sockets.extend(node.socket_ids());
            data.nodes.push(serializer::serialize_node(node));
        }
    }
    for id in &edges {
        let Some(edge) = doc.edge(*id) else { continue };
        let closed = sockets.contains(&edge.start()) && edge.end().is_some_and(|e| sockets.contains(&e));
        if closed {
            data.edges.extend(serializer::serialize_edge(edge));
        } else {
            log::debug!("clipboard: dropping {id}, one end is outside the selection");
        }
    }

    if delete && !(nodes.is_empty() && edges.is_empty()) {
        for id in edges {
            if doc.contains_edge(id) {
                doc.remove_edge(id);
            }
        }
        for id in nodes {
            doc.remove_node(id);
        }
        selection.clear();
        history.store_history(doc, "Cut out elements from scene", true)?;
        log::debug!(
            "cut {} nodes, {} edges",
            data.nodes.len(),
            data.edges.len()
        );
    }
    Ok(data)
}

/// Insert a payload with fresh ids, centred on `anchor`. Returns the new
/// node ids. On error `doc` is left as it was.
pub fn deserialize_from_clipboard(
    data: &ClipboardData,
    doc: &mut Document,
    history: &mut History,
    anchor: Point,
) -> Result<Vec<NodeId>> {
    let Some(center) = data.center() else {
        return Ok(Vec::new());
    };
    data.check_closed()?;
    let offset = anchor - center;

    let mut sockets = SocketMap::new();
    let mut added: Vec<NodeId> = Vec::with_capacity(data.nodes.len());
    let outcome = (|| -> Result<()> {
        for node_data in &data.nodes {
            let mut shifted = node_data.clone();
            shifted.pos_x += offset.x;
            shifted.pos_y += offset.y;
            let node = serializer::build_node(&shifted, false, &mut sockets)?;
            let id = doc.add_node(node).ok_or_else(|| {
                DocumentError::InvalidFile(format!("node {} is already in the scene", node_data.id))
            })?;
            added.push(id);
        }
        for edge_data in &data.edges {
            serializer::build_edge(edge_data, doc, false, &sockets)?;
        }
        Ok(())
    })();

    if let Err(err) = outcome {
        for id in added {
            doc.remove_node(id);
        }
        return Err(err);
    }

    history.store_history(doc, "Pasted elements in scene", true)?;
    log::debug!(
        "pasted {} nodes, {} edges at ({:.1}, {:.1})",
        data.nodes.len(),
        data.edges.len(),
        anchor.x,
        anchor.y
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsk_core::NodeKind;

    #[test]
    fn center_uses_the_true_bounding_box() {
        let mut doc = Document::new();
        doc.create_node(NodeKind::Pump, 100.0, 200.0);
        doc.create_node(NodeKind::Pump, 300.0, 400.0);
        let data = ClipboardData {
            nodes: doc.nodes().iter().map(serializer::serialize_node).collect(),
            edges: Vec::new(),
        };
        assert_eq!(data.center(), Some(Point::new(200.0, 300.0)));
    }

    #[test]
    fn cutting_an_empty_selection_records_nothing() {
        let mut doc = Document::new();
        doc.create_node(NodeKind::Pump, 0.0, 0.0);
        let mut history = History::new(&doc, 4);
        let mut selection = Selection::new();

        let data = serialize_selected(&mut doc, &mut selection, &mut history, true).unwrap();
        assert!(data.is_empty());
        assert!(history.is_empty());
        assert!(!doc.is_modified());
        assert_eq!(doc.nodes().len(), 1);
    }

    #[test]
    fn empty_payload_is_a_no_op() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 4);
        let added =
            deserialize_from_clipboard(&ClipboardData::default(), &mut doc, &mut history, Point::ZERO)
                .unwrap();
        assert!(added.is_empty());
        assert!(history.is_empty());
        assert!(!doc.is_modified());
    }

    #[test]
    fn text_transport_rejects_garbage() {
        assert!(matches!(
            ClipboardData::from_text("not json"),
            Err(DocumentError::InvalidFile(_))
        ));
        let text = ClipboardData::default().to_text().unwrap();
        assert_eq!(ClipboardData::from_text(&text).unwrap(), ClipboardData::default());
    }
}
