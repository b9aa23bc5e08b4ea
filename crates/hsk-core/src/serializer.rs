//! Conversion between a live [`Document`] and its plain-data form.
//!
//! The data form is what goes to disk (pretty JSON), to the clipboard, and
//! into history snapshots. Field names follow the established file format:
//!
//! ```json
//! { "id": 1, "scene_width": 64000.0, "scene_height": 64000.0,
//!   "nodes": [ { "id": 2, "node_type": "tank", "pos_x": 0.0, ... } ],
//!   "edges": [ { "id": 9, "edge_type": 3, "start": 3, "end": 7 } ] }
//! ```
//!
//! Deserialization is all-or-nothing: the graph is rebuilt into a staging
//! document and swapped in only once every node and edge resolved.

use crate::document::Document;
use crate::error::{DocumentError, Result};
use crate::geometry::EdgeStyle;
use crate::id::{DocumentId, EdgeId, NodeId, SocketId};
use crate::kind::{NodeKind, SocketType};
use crate::model::{Edge, Node};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Saved socket id → socket id in the rebuilt graph. Built per call.
pub type SocketMap = HashMap<SocketId, SocketId>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentData {
    pub id: DocumentId,
    pub scene_width: f64,
    pub scene_height: f64,
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    pub node_type: NodeKind,
    pub pos_x: f64,
    pub pos_y: f64,
    pub rotation: f64,
    pub scale: f64,
    pub value: f64,
    pub unit: String,
    #[serde(rename = "maxValue")]
    pub max_value: f64,
    #[serde(rename = "minValue")]
    pub min_value: f64,
    pub text: String,
    pub sockets: Vec<SocketData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketData {
    pub id: SocketId,
    pub index: usize,
    /// Absent in older files, see [`SocketData::is_multi_edge`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_edges: Option<bool>,
    /// Side of the node, only written by older files (1..=4, right side = 3, 4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u8>,
    pub socket_type: SocketType,
}

impl SocketData {
    /// The saved flag, or for older files without one: sockets on the
    /// right-hand side accept several edges.
    pub fn is_multi_edge(&self) -> bool {
        self.multi_edges
            .unwrap_or(matches!(self.position, Some(LEGACY_RIGHT_TOP | LEGACY_RIGHT_BOTTOM)))
    }
}

const LEGACY_RIGHT_TOP: u8 = 3;
const LEGACY_RIGHT_BOTTOM: u8 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub id: EdgeId,
    pub edge_type: EdgeStyle,
    pub start: SocketId,
    pub end: SocketId,
}

// ─── Document → data ─────────────────────────────────────────────────────

pub fn serialize(doc: &Document) -> DocumentData {
    DocumentData {
        id: doc.id(),
        scene_width: doc.width(),
        scene_height: doc.height(),
        nodes: doc.nodes().iter().map(serialize_node).collect(),
        edges: doc.edges().iter().filter_map(serialize_edge).collect(),
    }
}

pub fn serialize_node(node: &Node) -> NodeData {
    NodeData {
        id: node.id(),
        node_type: node.kind(),
        pos_x: node.position().x,
        pos_y: node.position().y,
        rotation: node.rotation(),
        scale: node.scale(),
        value: node.value(),
        unit: node.unit().to_string(),
        max_value: node.max(),
        min_value: node.min(),
        text: node.text().to_string(),
        sockets: node
            .sockets()
            .iter()
            .map(|s| SocketData {
                id: s.id(),
                index: s.index(),
                multi_edges: Some(s.is_multi_edge()),
                position: None,
                socket_type: s.socket_type(),
            })
            .collect(),
    }
}

/// Provisional edges are interaction state and are never persisted.
pub fn serialize_edge(edge: &Edge) -> Option<EdgeData> {
    Some(EdgeData {
        id: edge.id(),
        edge_type: edge.style(),
        start: edge.start(),
        end: edge.end()?,
    })
}

// ─── Data → document ─────────────────────────────────────────────────────

/// Replace the contents of `doc` with `data`.
///
/// With `restore_id` the saved ids are reused (file load, undo/redo);
/// otherwise every entity gets a fresh id and `doc` keeps its own id.
/// On error `doc` is untouched.
pub fn deserialize(data: &DocumentData, doc: &mut Document, restore_id: bool) -> Result<()> {
    let mut staged = Document::with_size(data.scene_width, data.scene_height);
    staged.id = if restore_id { data.id } else { doc.id() };

    let mut sockets = SocketMap::new();
    for node_data in &data.nodes {
        let node = build_node(node_data, restore_id, &mut sockets)?;
        if staged.add_node(node).is_none() {
            return Err(DocumentError::InvalidFile(format!(
                "duplicate node or socket id in node {}",
                node_data.id
            )));
        }
    }
    for edge_data in &data.edges {
        build_edge(edge_data, &mut staged, restore_id, &sockets)?;
    }

    log::debug!(
        "deserialized {} nodes, {} edges (restore_id={restore_id})",
        staged.nodes.len(),
        staged.edges.len()
    );
    doc.replace_graph(staged);
    Ok(())
}

/// Rebuild one node with its canonical sockets, recording every saved
/// socket id in `sockets`. The node is not added to any document.
pub fn build_node(data: &NodeData, restore_id: bool, sockets: &mut SocketMap) -> Result<Node> {
    let id = if restore_id { data.id } else { NodeId::fresh() };
    let mut node = Node::with_id(id, data.node_type);

    if data.sockets.len() != node.sockets.len() {
        log::warn!(
            "{}: {} saved sockets, {} expected for {}",
            data.id,
            data.sockets.len(),
            node.sockets.len(),
            data.node_type.as_str()
        );
    }
    for saved in &data.sockets {
        let Some(socket) = node.sockets.get_mut(saved.index) else {
            log::warn!("{}: dropping socket {} at index {}", data.id, saved.id, saved.index);
            continue;
        };
        if sockets.contains_key(&saved.id) {
            return Err(DocumentError::InvalidFile(format!(
                "duplicate socket id {}",
                saved.id
            )));
        }
        if restore_id {
            socket.id = saved.id;
        }
        socket.multi_edge = saved.is_multi_edge();
        socket.socket_type = saved.socket_type;
        sockets.insert(saved.id, socket.id);
    }

    node.set_position(Point::new(data.pos_x, data.pos_y));
    node.set_rotation(data.rotation);
    if let Err(err) = node.set_absolute_scale(data.scale) {
        log::warn!("{}: {err}; keeping scale 1", data.id);
    }
    if let Err(err) = node.restore_range(data.min_value, data.max_value, data.value) {
        log::warn!("{}: {err}; keeping defaults", data.id);
    }
    node.set_unit(data.unit.clone());
    node.set_text(data.text.clone());
    Ok(node)
}

/// Rebuild one edge inside `doc`, resolving its endpoints through `sockets`.
pub fn build_edge(
    data: &EdgeData,
    doc: &mut Document,
    restore_id: bool,
    sockets: &SocketMap,
) -> Result<EdgeId> {
    let resolve = |socket: SocketId| {
        sockets
            .get(&socket)
            .copied()
            .ok_or(DocumentError::DanglingReference {
                edge: data.id,
                socket,
            })
    };
    let start = resolve(data.start)?;
    let end = resolve(data.end)?;

    let id = if restore_id { data.id } else { EdgeId::fresh() };
    if doc.contains_edge(id) {
        return Err(DocumentError::InvalidFile(format!("duplicate edge id {id}")));
    }
    doc.insert_edge(id, start, Some(end), data.edge_type)
}

// ─── JSON ────────────────────────────────────────────────────────────────

/// Pretty JSON with four-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|err| DocumentError::InvalidFile(err.to_string()))
}

pub fn to_json(doc: &Document) -> Result<String> {
    to_pretty_json(&serialize(doc))
}

pub fn from_json(text: &str) -> Result<DocumentData> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_node_doc() -> (Document, SocketId, SocketId) {
        let mut doc = Document::new();
        let a = doc.create_node(NodeKind::FlowMeter, -75.0, 0.0);
        let b = doc.create_node(NodeKind::Tank, 200.0, -150.0);
        let sa = doc.node(a).unwrap().sockets()[0].id();
        let sb = doc.node(b).unwrap().sockets()[0].id();
        doc.add_edge(sa, Some(sb), EdgeStyle::Orthogonal).unwrap();
        (doc, sa, sb)
    }

    #[test]
    fn field_names_match_file_format() {
        let (doc, _, _) = two_node_doc();
        let json = to_json(&doc).unwrap();
        for key in [
            "\"scene_width\"",
            "\"scene_height\"",
            "\"node_type\": \"flow meter\"",
            "\"pos_x\"",
            "\"maxValue\"",
            "\"minValue\"",
            "\"multi_edges\"",
            "\"socket_type\"",
            "\"edge_type\": 3",
        ] {
            assert!(json.contains(key), "missing {key} in\n{json}");
        }
        assert!(json.contains("\n    \"id\""));
    }

    #[test]
    fn older_sockets_without_multi_edges_use_their_side() {
        let json = r#"{
            "id": 900, "scene_width": 1000.0, "scene_height": 1000.0,
            "nodes": [{
                "id": 901, "node_type": "pump", "pos_x": 0.0, "pos_y": 0.0,
                "rotation": 0.0, "scale": 1.0, "value": 0.0, "unit": "L/min",
                "maxValue": 100.0, "minValue": 0.0, "text": "",
                "sockets": [
                    { "id": 902, "index": 0, "position": 1, "socket_type": 2 },
                    { "id": 903, "index": 1, "position": 4, "socket_type": 2 }
                ]
            }],
            "edges": []
        }"#;
        let data = from_json(json).unwrap();
        let mut doc = Document::new();
        deserialize(&data, &mut doc, true).unwrap();

        let sockets = doc.nodes()[0].sockets();
        assert!(!sockets[0].is_multi_edge());
        assert!(sockets[1].is_multi_edge());

        let saved = to_json(&doc).unwrap();
        assert!(saved.contains("\"multi_edges\": false"));
        assert!(!saved.contains("\"position\""));
    }

    #[test]
    fn restore_keeps_ids_and_fresh_mode_does_not() {
        let (doc, sa, _) = two_node_doc();
        let data = serialize(&doc);

        let mut restored = Document::new();
        deserialize(&data, &mut restored, true).unwrap();
        assert_eq!(restored.id(), doc.id());
        assert_eq!(serialize(&restored), data);

        let mut fresh = Document::new();
        let own_id = fresh.id();
        deserialize(&data, &mut fresh, false).unwrap();
        assert_eq!(fresh.id(), own_id);
        assert!(fresh.socket(sa).is_none());
        assert_eq!(fresh.edges().len(), 1);
    }

    #[test]
    fn dangling_edge_aborts_without_touching_the_target() {
        let (doc, _, _) = two_node_doc();
        let mut data = serialize(&doc);
        let missing = SocketId::fresh();
        data.edges[0].end = missing;

        let mut target = Document::new();
        let keep = target.create_node(NodeKind::Gauge, 1.0, 2.0);
        let err = deserialize(&data, &mut target, true).unwrap_err();
        assert!(matches!(err, DocumentError::DanglingReference { socket, .. } if socket == missing));
        assert_eq!(target.node_ids(), vec![keep]);
    }

    #[test]
    fn provisional_edges_are_not_serialized() {
        let (mut doc, sa, _) = two_node_doc();
        doc.add_edge(sa, None, EdgeStyle::Orthogonal).unwrap();
        assert_eq!(doc.edges().len(), 2);
        assert_eq!(serialize(&doc).edges.len(), 1);
    }

    #[test]
    fn out_of_range_saved_value_keeps_defaults() {
        let (doc, _, _) = two_node_doc();
        let mut data = serialize(&doc);
        data.nodes[1].value = 500.0;
        let mut target = Document::new();
        deserialize(&data, &mut target, true).unwrap();
        assert_eq!(target.nodes()[1].value(), 20.0);
    }
}
