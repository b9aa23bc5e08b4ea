//! Diagram entities: nodes, their sockets, and the edges between sockets.
//!
//! Ownership is strictly top-down: the [`Document`](crate::Document) owns
//! every `Node` and `Edge`, and each `Node` owns its `Socket`s. All reverse
//! links (socket → node, edge → socket, socket → attached edges) are plain
//! ids resolved through the document, never shared pointers.

use crate::error::{DocumentError, Result};
use crate::geometry::{self, EdgeStyle};
use crate::id::{EdgeId, NodeId, SocketId};
use crate::kind::{NodeKind, SocketType};
use kurbo::{Affine, BezPath, Point, Size};
use smallvec::SmallVec;

// ─── Socket ──────────────────────────────────────────────────────────────

/// A connection point on a node.
///
/// Its position is never stored: it is derived from the owning node's
/// canonical layout (by `index`) and the node's current transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Socket {
    pub(crate) id: SocketId,
    pub(crate) node: NodeId,
    pub(crate) index: usize,
    pub(crate) socket_type: SocketType,
    pub(crate) multi_edge: bool,
    pub(crate) edges: SmallVec<[EdgeId; 4]>,
}

impl Socket {
    pub(crate) fn new(node: NodeId, index: usize, socket_type: SocketType) -> Self {
        Self {
            id: SocketId::fresh(),
            node,
            index,
            socket_type,
            multi_edge: true,
            edges: SmallVec::new(),
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// The node this socket belongs to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    /// Whether more than one edge may attach at once.
    pub fn is_multi_edge(&self) -> bool {
        self.multi_edge
    }

    /// Attached edges, oldest first.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }

    pub(crate) fn add_edge(&mut self, edge: EdgeId) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub(crate) fn remove_edge(&mut self, edge: EdgeId) -> bool {
        match self.edges.iter().position(|e| *e == edge) {
            Some(pos) => {
                self.edges.remove(pos);
                true
            }
            None => {
                log::warn!("{}: asked to detach {edge}, which is not attached", self.id);
                false
            }
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A positioned hydraulic component with a fixed set of sockets.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) position: Point,
    /// Clockwise, degrees, cumulative.
    pub(crate) rotation: f64,
    pub(crate) scale: f64,
    /// Accumulator for relative scaling; kept equal to `scale`.
    pub(crate) scale_factor: f64,
    pub(crate) value: f64,
    pub(crate) min: f64,
    pub(crate) max: f64,
    pub(crate) unit: String,
    pub(crate) text: String,
    pub(crate) sockets: SmallVec<[Socket; 4]>,
}

impl Node {
    /// Build a node of `kind` with its canonical sockets and display defaults.
    /// The node lives outside any document until passed to
    /// [`Document::add_node`](crate::Document::add_node).
    pub fn new(kind: NodeKind) -> Self {
        Self::with_id(NodeId::fresh(), kind)
    }

    pub(crate) fn with_id(id: NodeId, kind: NodeKind) -> Self {
        let desc = kind.descriptor();
        let sockets = desc
            .sockets
            .iter()
            .enumerate()
            .map(|(index, anchor)| Socket::new(id, index, anchor.socket_type))
            .collect();
        Self {
            id,
            kind,
            position: Point::ZERO,
            rotation: 0.0,
            scale: 1.0,
            scale_factor: 1.0,
            value: desc.value,
            min: desc.min,
            max: desc.max,
            unit: desc.unit.to_string(),
            text: desc.text.to_string(),
            sockets,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Position of `value` within `[min, max]`, from 0.0 to 1.0.
    pub fn percent(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            0.0
        } else {
            (self.value - self.min) / span
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sockets(&self) -> &[Socket] {
        &self.sockets
    }

    pub fn socket(&self, index: usize) -> Option<&Socket> {
        self.sockets.get(index)
    }

    pub fn socket_ids(&self) -> impl Iterator<Item = SocketId> + '_ {
        self.sockets.iter().map(|s| s.id)
    }

    pub(crate) fn socket_by_id_mut(&mut self, id: SocketId) -> Option<&mut Socket> {
        self.sockets.iter_mut().find(|s| s.id == id)
    }

    /// Unscaled size. Text nodes grow with their content.
    pub fn size(&self) -> Size {
        let desc = self.kind.descriptor();
        match self.kind {
            NodeKind::Text => {
                let chars = self.text.chars().count() as f64;
                Size::new(desc.height * (chars + 1.0) / 2.0, desc.height)
            }
            _ => Size::new(desc.width, desc.height),
        }
    }

    // ─── Value & display ─────────────────────────────────────────────

    /// Assign `value` if it lies within `[min, max]`; otherwise leave the
    /// node untouched.
    pub fn try_set_value(&mut self, value: f64) -> Result<()> {
        if !(self.min..=self.max).contains(&value) {
            return Err(DocumentError::OutOfRangeValue {
                value,
                min: self.min,
                max: self.max,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Lower the bound; rejected when it would exceed the current value.
    pub fn set_min(&mut self, min: f64) -> Result<()> {
        if min > self.value || min.is_nan() {
            return Err(DocumentError::OutOfRangeValue {
                value: self.value,
                min,
                max: self.max,
            });
        }
        self.min = min;
        Ok(())
    }

    /// Raise the bound; rejected when it would fall below the current value.
    pub fn set_max(&mut self, max: f64) -> Result<()> {
        if max < self.value || max.is_nan() {
            return Err(DocumentError::OutOfRangeValue {
                value: self.value,
                min: self.min,
                max,
            });
        }
        self.max = max;
        Ok(())
    }

    /// Replace range and value together, as read from a file.
    pub(crate) fn restore_range(&mut self, min: f64, max: f64, value: f64) -> Result<()> {
        if !(min <= value && value <= max) {
            return Err(DocumentError::OutOfRangeValue { value, min, max });
        }
        self.min = min;
        self.max = max;
        self.value = value;
        Ok(())
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    // ─── Transform ───────────────────────────────────────────────────
    //
    // Transform setters are crate-private: attached edges must be refreshed
    // after every change, which only the document can do.

    pub fn transform(&self) -> Affine {
        geometry::node_transform(self.position, self.rotation, self.scale)
    }

    /// Socket anchor in node-local coordinates.
    pub fn socket_local_position(&self, index: usize) -> Option<Point> {
        let anchor = self.kind.descriptor().sockets.get(index).copied()?;
        let size = self.size();
        Some(Point::new(anchor.fx * size.width, anchor.fy * size.height))
    }

    /// Socket anchor in scene coordinates.
    pub fn socket_position(&self, index: usize) -> Option<Point> {
        self.socket_local_position(index)
            .map(|local| self.transform() * local)
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_rotation(&mut self, degrees: f64) {
        self.rotation = degrees;
    }

    pub(crate) fn set_absolute_scale(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(DocumentError::InvalidScale(factor));
        }
        self.scale = factor;
        self.scale_factor = factor;
        Ok(())
    }

    pub(crate) fn set_relative_scale(&mut self, delta: f64) -> Result<()> {
        self.set_absolute_scale(self.scale_factor + delta)
    }
}

// ─── Edge ────────────────────────────────────────────────────────────────

/// A link between two sockets.
///
/// `end` is `None` only while the edge is being dragged out interactively.
/// `source` / `destination` are the endpoint coordinates last pushed by the
/// document; they are recomputed after every transform of an attached node.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub(crate) id: EdgeId,
    pub(crate) start: SocketId,
    pub(crate) end: Option<SocketId>,
    pub(crate) style: EdgeStyle,
    pub(crate) source: Point,
    pub(crate) destination: Point,
}

impl Edge {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn start(&self) -> SocketId {
        self.start
    }

    pub fn end(&self) -> Option<SocketId> {
        self.end
    }

    pub fn style(&self) -> EdgeStyle {
        self.style
    }

    /// Half-connected edge used while dragging out a new connection.
    pub fn is_provisional(&self) -> bool {
        self.end.is_none()
    }

    pub fn source(&self) -> Point {
        self.source
    }

    pub fn destination(&self) -> Point {
        self.destination
    }

    /// Whether `socket` is one of this edge's endpoints.
    pub fn touches(&self, socket: SocketId) -> bool {
        self.start == socket || self.end == Some(socket)
    }

    /// The drawn route of this edge.
    pub fn path(&self) -> BezPath {
        geometry::edge_path(self.style, self.source, self.destination)
    }

    /// Whether the segment `p1 → p2` crosses the drawn route.
    pub fn intersects_segment(&self, p1: Point, p2: Point) -> bool {
        geometry::segment_crosses_path(&self.path(), p1, p2)
    }
}
