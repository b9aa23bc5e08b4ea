//! Starter scene shown by a fresh editor.

use hsk_core::{Document, DocumentError, EdgeId, EdgeStyle, NodeId, NodeKind, Result};

/// Populate `doc` with one of each main component and a single pipe from
/// the flow meter's upper port to the tank inlet.
pub fn populate_demo(doc: &mut Document) -> Result<EdgeId> {
    let sensor = doc.create_node(NodeKind::PressureSensor, -350.0, -250.0);
    let tank = doc.create_node(NodeKind::Tank, -75.0, 0.0);
    let meter = doc.create_node(NodeKind::FlowMeter, 200.0, -150.0);
    doc.create_node(NodeKind::Gauge, -200.0, -150.0);
    doc.create_node(NodeKind::ServoValve, 0.0, 0.0);
    doc.create_node(NodeKind::PistonDual, -300.0, -250.0);
    doc.create_node(NodeKind::SimpleTank, 0.0, 0.0);
    doc.rotate_node(sensor, 90.0);

    let first_socket = |doc: &Document, node: NodeId| {
        doc.node(node)
            .and_then(|n| n.socket(0))
            .map(|s| s.id())
            .ok_or_else(|| DocumentError::InvalidFile(format!("{node} has no sockets")))
    };
    let from = first_socket(&*doc, meter)?;
    let to = first_socket(&*doc, tank)?;
    doc.add_edge(from, Some(to), EdgeStyle::Orthogonal)
}
