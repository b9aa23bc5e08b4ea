//! Integration tests: structural integrity of the document (hsk-core).
//!
//! Cascading removal, single-edge sockets, edge geometry refresh, and the
//! all-or-nothing file load.

use hsk_core::serializer::{self, DocumentData};
use hsk_core::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

/// Node A (flow meter, sockets 10 and 11) and node B (tank, socket 20),
/// joined by edge 30 from socket 10 to socket 20.
const TWO_NODES: &str = r#"{
    "id": 1,
    "scene_width": 64000.0,
    "scene_height": 64000.0,
    "nodes": [
        {
            "id": 2, "node_type": "flow meter", "pos_x": 0.0, "pos_y": 0.0,
            "rotation": 0.0, "scale": 1.0, "value": 0.0, "unit": "mL",
            "maxValue": 100.0, "minValue": 0.0, "text": "",
            "sockets": [
                { "id": 10, "index": 0, "multi_edges": true, "socket_type": 2 },
                { "id": 11, "index": 1, "multi_edges": true, "socket_type": 2 }
            ]
        },
        {
            "id": 3, "node_type": "tank", "pos_x": 600.0, "pos_y": 0.0,
            "rotation": 0.0, "scale": 1.0, "value": 20.0, "unit": "cm",
            "maxValue": 100.0, "minValue": 0.0, "text": "",
            "sockets": [
                { "id": 20, "index": 0, "multi_edges": true, "socket_type": 2 }
            ]
        }
    ],
    "edges": [
        { "id": 30, "edge_type": 3, "start": 10, "end": 20 }
    ]
}"#;

fn two_nodes() -> Document {
    let data: DocumentData = serializer::from_json(TWO_NODES).unwrap();
    let mut doc = Document::new();
    serializer::deserialize(&data, &mut doc, true).unwrap();
    doc
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hsk-{}-{name}.json", std::process::id()))
}

// ─── Cascading removal ───────────────────────────────────────────────────

#[test]
fn removing_a_node_removes_its_edges() {
    let mut doc = two_nodes();
    assert_eq!(doc.edges().len(), 1);

    doc.remove_node(NodeId::restore(2));

    assert!(doc.edges().is_empty());
    assert_eq!(doc.node_ids(), vec![NodeId::restore(3)]);
    assert!(!doc.socket(SocketId::restore(20)).unwrap().has_edges());
}

#[test]
fn every_complete_edge_is_listed_on_both_sockets() {
    let mut doc = two_nodes();
    let extra = doc
        .add_edge(SocketId::restore(11), Some(SocketId::restore(20)), EdgeStyle::Bezier)
        .unwrap();

    for edge in doc.edges() {
        let end = edge.end().unwrap();
        assert!(doc.socket(edge.start()).unwrap().edges().contains(&edge.id()));
        assert!(doc.socket(end).unwrap().edges().contains(&edge.id()));
    }
    assert_eq!(
        doc.socket(SocketId::restore(20)).unwrap().edges(),
        &[EdgeId::restore(30), extra]
    );
}

#[test]
fn single_edge_socket_keeps_only_the_new_connection() {
    let mut doc = two_nodes();
    doc.set_socket_multi_edge(SocketId::restore(20), false);

    let replacement = doc
        .add_edge(SocketId::restore(11), Some(SocketId::restore(20)), EdgeStyle::Direct)
        .unwrap();

    assert_eq!(doc.edge_ids(), vec![replacement]);
    assert!(!doc.socket(SocketId::restore(10)).unwrap().has_edges());
}

// ─── Geometry refresh ────────────────────────────────────────────────────

#[test]
fn moving_a_node_drags_its_edge_endpoints() {
    let mut doc = two_nodes();
    let edge = EdgeId::restore(30);
    // Flow meter top socket sits 200 above the centre.
    assert_eq!(doc.edge(edge).unwrap().source(), Point::new(0.0, -200.0));
    // Tank top socket sits 500 above the centre.
    assert_eq!(doc.edge(edge).unwrap().destination(), Point::new(600.0, -500.0));

    doc.move_node(NodeId::restore(2), Vec2::new(50.0, 25.0));
    assert_eq!(doc.edge(edge).unwrap().source(), Point::new(50.0, -175.0));

    doc.set_node_position(NodeId::restore(3), 0.0, 0.0);
    assert_eq!(doc.edge(edge).unwrap().destination(), Point::new(0.0, -500.0));
}

// ─── Files ───────────────────────────────────────────────────────────────

#[test]
fn save_then_load_reproduces_the_document() {
    let path = temp_path("roundtrip");
    let mut doc = two_nodes();
    doc.mark_modified();
    doc.save_to_file(&path).unwrap();
    assert!(!doc.is_modified());

    let mut loaded = Document::new();
    loaded.load_from_file(&path).unwrap();
    assert_eq!(serializer::serialize(&loaded), serializer::serialize(&doc));
    assert!(!loaded.is_modified());

    std::fs::remove_file(&path).ok();
}

#[test]
fn failed_load_leaves_document_untouched() {
    let path = temp_path("dangling");
    std::fs::write(&path, TWO_NODES.replace("\"end\": 20", "\"end\": 99")).unwrap();

    let mut doc = Document::new();
    let kept = doc.create_node(NodeKind::Pump, 5.0, 5.0);
    doc.mark_modified();
    let before = serializer::serialize(&doc);

    let err = doc.load_from_file(&path).unwrap_err();
    assert!(matches!(err, DocumentError::DanglingReference { .. }));
    assert_eq!(serializer::serialize(&doc), before);
    assert_eq!(doc.node_ids(), vec![kept]);
    assert!(doc.is_modified());

    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_an_io_error() {
    let mut doc = Document::new();
    let err = doc.load_from_file(temp_path("does-not-exist")).unwrap_err();
    assert!(matches!(err, DocumentError::Io(_)));
}
