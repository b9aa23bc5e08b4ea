//! The diagram document: exclusive owner of every node and edge, unit of
//! load/save, and holder of the modified flag.
//!
//! Every structural change goes through the document so that edge
//! registrations on sockets stay consistent:
//!
//! - an edge with both ends is listed in exactly two sockets' edge lists,
//!   a provisional (mid-drag) edge in exactly one;
//! - removing a node first removes every edge attached to its sockets;
//! - every transform of a node refreshes the cached endpoints of the edges
//!   attached to it.

use crate::error::{DocumentError, Result};
use crate::geometry::EdgeStyle;
use crate::id::{DocumentId, EdgeId, NodeId, SocketId};
use crate::kind::NodeKind;
use crate::model::{Edge, Node, Socket};
use crate::serializer;
use kurbo::{Point, Vec2};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const DEFAULT_SCENE_WIDTH: f64 = 64_000.0;
pub const DEFAULT_SCENE_HEIGHT: f64 = 64_000.0;

type ModifiedListener = Box<dyn FnMut()>;

pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) width: f64,
    pub(crate) height: f64,
    /// Insertion order is serialization order.
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    /// Socket → owning node, for O(1) socket lookup.
    pub(crate) socket_owner: HashMap<SocketId, NodeId>,
    modified: bool,
    modified_listeners: Vec<ModifiedListener>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(DEFAULT_SCENE_WIDTH, DEFAULT_SCENE_HEIGHT)
    }

    #[must_use]
    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            id: DocumentId::fresh(),
            width,
            height,
            nodes: Vec::new(),
            edges: Vec::new(),
            socket_owner: HashMap::new(),
            modified: false,
            modified_listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    // ─── Lookup ──────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.iter().map(|e| e.id).collect()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable access for value/unit/text edits. Transform changes go through
    /// the document (`set_node_position`, `rotate_node`, …).
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge(id).is_some()
    }

    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        let owner = *self.socket_owner.get(&id)?;
        self.node(owner)?.sockets.iter().find(|s| s.id == id)
    }

    fn socket_mut(&mut self, id: SocketId) -> Option<&mut Socket> {
        let owner = *self.socket_owner.get(&id)?;
        self.node_mut(owner)?.socket_by_id_mut(id)
    }

    /// Scene position of a socket under its node's current transform.
    pub fn socket_position(&self, id: SocketId) -> Option<Point> {
        let socket = self.socket(id)?;
        self.node(socket.node)?.socket_position(socket.index)
    }

    /// Every edge attached to any socket of `node`, without duplicates.
    pub fn edges_of_node(&self, node: NodeId) -> Vec<EdgeId> {
        let mut out: Vec<EdgeId> = Vec::new();
        if let Some(node) = self.node(node) {
            for socket in node.sockets() {
                for edge in socket.edges() {
                    if !out.contains(edge) {
                        out.push(*edge);
                    }
                }
            }
        }
        out
    }

    // ─── Nodes ───────────────────────────────────────────────────────

    /// Register a node built with [`Node::new`]. Returns its id, or `None`
    /// when the node or one of its sockets is already registered.
    pub fn add_node(&mut self, node: Node) -> Option<NodeId> {
        let id = node.id;
        if self.contains_node(id) || node.socket_ids().any(|s| self.socket_owner.contains_key(&s)) {
            log::warn!("add_node: {id} or one of its sockets is already registered; ignoring");
            return None;
        }
        Some(self.insert_node(node))
    }

    fn insert_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        for socket in node.socket_ids() {
            self.socket_owner.insert(socket, id);
        }
        log::debug!("add {id} ({})", node.kind.as_str());
        self.nodes.push(node);
        id
    }

    /// Build a node of `kind` at `(x, y)` and register it.
    pub fn create_node(&mut self, kind: NodeKind, x: f64, y: f64) -> NodeId {
        let mut node = Node::new(kind);
        node.set_position(Point::new(x, y));
        // Freshly minted ids cannot collide.
        self.insert_node(node)
    }

    /// Remove a node after removing every edge attached to its sockets.
    /// Absent nodes are a logged no-op.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let Some(pos) = self.nodes.iter().position(|n| n.id == id) else {
            log::warn!("remove_node: {id} is not in the document");
            return None;
        };
        let sockets: Vec<SocketId> = self.nodes[pos].socket_ids().collect();
        for socket in &sockets {
            self.remove_all_edges(*socket);
        }
        // Positions may have shifted if edge removal touched the node list.
        let pos = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(pos);
        for socket in &sockets {
            self.socket_owner.remove(socket);
        }
        log::debug!("removed {id}");
        Some(node)
    }

    // ─── Edges ───────────────────────────────────────────────────────

    /// Create an edge from `start` to `end` and register it with both
    /// sockets. With `end == None` the edge is provisional (drag feedback)
    /// and is only registered on `start`.
    ///
    /// For a complete edge, a single-edge socket on either end is cleared of
    /// its existing edges first.
    pub fn add_edge(
        &mut self,
        start: SocketId,
        end: Option<SocketId>,
        style: EdgeStyle,
    ) -> Result<EdgeId> {
        self.insert_edge(EdgeId::fresh(), start, end, style)
    }

    pub(crate) fn insert_edge(
        &mut self,
        id: EdgeId,
        start: SocketId,
        end: Option<SocketId>,
        style: EdgeStyle,
    ) -> Result<EdgeId> {
        for socket in std::iter::once(start).chain(end) {
            if self.socket(socket).is_none() {
                return Err(DocumentError::UnknownSocket(socket));
            }
        }
        if end == Some(start) {
            return Err(DocumentError::SelfConnection(start));
        }
        if let Some(end) = end {
            self.clear_single_edge_socket(start);
            self.clear_single_edge_socket(end);
        }

        for socket in std::iter::once(start).chain(end) {
            if let Some(s) = self.socket_mut(socket) {
                s.add_edge(id);
            }
        }
        self.edges.push(Edge {
            id,
            start,
            end,
            style,
            source: Point::ZERO,
            destination: Point::ZERO,
        });
        self.update_edge_positions(id);
        log::debug!("add {id}: {start} -> {end:?} ({style:?})");
        Ok(id)
    }

    fn clear_single_edge_socket(&mut self, socket: SocketId) {
        let single = self.socket(socket).is_some_and(|s| !s.multi_edge && s.has_edges());
        if single {
            log::debug!("{socket} accepts a single edge; clearing before connect");
            self.remove_all_edges(socket);
        }
    }

    /// Detach an edge from its sockets and drop it. Removing an edge that is
    /// already gone is a logged no-op.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let Some(pos) = self.edges.iter().position(|e| e.id == id) else {
            log::warn!("remove_edge: {id} is not in the document");
            return None;
        };
        let edge = self.edges.remove(pos);
        for socket in std::iter::once(edge.start).chain(edge.end) {
            if let Some(s) = self.socket_mut(socket) {
                s.remove_edge(id);
            }
        }
        log::debug!("removed {id}");
        Some(edge)
    }

    /// Remove every edge attached to `socket`, oldest first. Returns how many
    /// edges were removed.
    pub fn remove_all_edges(&mut self, socket: SocketId) -> usize {
        let mut removed = 0;
        loop {
            let Some(front) = self.socket(socket).and_then(|s| s.edges.first().copied()) else {
                break;
            };
            if self.remove_edge(front).is_some() {
                removed += 1;
            } else if let Some(s) = self.socket_mut(socket) {
                // Stale registration: drop it so the loop makes progress.
                s.edges.remove(0);
            }
        }
        removed
    }

    /// Re-point the start of an edge, unregistering from the previous socket
    /// first.
    pub fn set_edge_start(&mut self, edge: EdgeId, socket: SocketId) -> Result<()> {
        if self.socket(socket).is_none() {
            return Err(DocumentError::UnknownSocket(socket));
        }
        let Some(old) = self.edge(edge).map(|e| e.start) else {
            log::warn!("set_edge_start: {edge} is not in the document");
            return Ok(());
        };
        if let Some(s) = self.socket_mut(old) {
            s.remove_edge(edge);
        }
        if let Some(e) = self.edges.iter_mut().find(|e| e.id == edge) {
            e.start = socket;
        }
        if let Some(s) = self.socket_mut(socket) {
            s.add_edge(edge);
        }
        self.update_edge_positions(edge);
        Ok(())
    }

    /// Re-point (or clear, with `None`) the end of an edge, unregistering from
    /// the previous socket first.
    pub fn set_edge_end(&mut self, edge: EdgeId, socket: Option<SocketId>) -> Result<()> {
        if let Some(socket) = socket.filter(|s| self.socket(*s).is_none()) {
            return Err(DocumentError::UnknownSocket(socket));
        }
        let Some(old) = self.edge(edge).map(|e| e.end) else {
            log::warn!("set_edge_end: {edge} is not in the document");
            return Ok(());
        };
        if let Some(s) = old.and_then(|old| self.socket_mut(old)) {
            s.remove_edge(edge);
        }
        if let Some(e) = self.edges.iter_mut().find(|e| e.id == edge) {
            e.end = socket;
        }
        if let Some(s) = socket.and_then(|socket| self.socket_mut(socket)) {
            s.add_edge(edge);
        }
        self.update_edge_positions(edge);
        Ok(())
    }

    pub fn set_edge_style(&mut self, edge: EdgeId, style: EdgeStyle) {
        match self.edges.iter_mut().find(|e| e.id == edge) {
            Some(e) => e.style = style,
            None => log::warn!("set_edge_style: {edge} is not in the document"),
        }
    }

    /// Mark a socket as single- or multi-edge. Turning a socket single-edge
    /// keeps only its most recent edge.
    pub fn set_socket_multi_edge(&mut self, socket: SocketId, multi_edge: bool) {
        let surplus: Vec<EdgeId> = match self.socket_mut(socket) {
            Some(s) => {
                s.multi_edge = multi_edge;
                if multi_edge || s.edges.len() <= 1 {
                    Vec::new()
                } else {
                    s.edges[..s.edges.len() - 1].to_vec()
                }
            }
            None => {
                log::warn!("set_socket_multi_edge: {socket} is not in the document");
                return;
            }
        };
        for edge in surplus {
            self.remove_edge(edge);
        }
    }

    // ─── Geometry refresh ────────────────────────────────────────────

    /// Recompute an edge's endpoints from its sockets. A provisional edge
    /// collapses both endpoints onto its start socket.
    pub fn update_edge_positions(&mut self, edge: EdgeId) {
        let Some((start, end)) = self.edge(edge).map(|e| (e.start, e.end)) else {
            return;
        };
        let Some(source) = self.socket_position(start) else {
            return;
        };
        let destination = end.and_then(|s| self.socket_position(s)).unwrap_or(source);
        if let Some(e) = self.edges.iter_mut().find(|e| e.id == edge) {
            e.source = source;
            e.destination = destination;
        }
    }

    /// Move the free end of a provisional edge (drag feedback). Ignored for
    /// edges with both ends attached.
    pub fn set_edge_free_end(&mut self, edge: EdgeId, point: Point) {
        if let Some(e) = self
            .edges
            .iter_mut()
            .find(|e| e.id == edge && e.end.is_none())
        {
            e.destination = point;
        }
    }

    /// Refresh every edge attached to `node`.
    pub fn refresh_node_edges(&mut self, node: NodeId) {
        for edge in self.edges_of_node(node) {
            self.update_edge_positions(edge);
        }
    }

    // ─── Node transforms ─────────────────────────────────────────────

    fn with_node<R>(&mut self, id: NodeId, op: &str, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let out = match self.node_mut(id) {
            Some(node) => f(node),
            None => {
                log::warn!("{op}: {id} is not in the document");
                return None;
            }
        };
        self.refresh_node_edges(id);
        Some(out)
    }

    pub fn set_node_position(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        self.with_node(id, "set_node_position", |n| n.set_position(Point::new(x, y)))
            .is_some()
    }

    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        self.with_node(id, "move_node", |n| n.set_position(n.position + delta))
            .is_some()
    }

    /// Rotate clockwise by `delta` degrees about the node centre.
    pub fn rotate_node(&mut self, id: NodeId, delta: f64) -> bool {
        self.with_node(id, "rotate_node", |n| n.set_rotation(n.rotation + delta))
            .is_some()
    }

    pub fn set_node_rotation(&mut self, id: NodeId, degrees: f64) -> bool {
        self.with_node(id, "set_node_rotation", |n| n.set_rotation(degrees))
            .is_some()
    }

    pub fn set_node_absolute_scale(&mut self, id: NodeId, factor: f64) -> Result<()> {
        self.with_node(id, "set_node_absolute_scale", |n| n.set_absolute_scale(factor))
            .unwrap_or(Ok(()))
    }

    pub fn set_node_relative_scale(&mut self, id: NodeId, delta: f64) -> Result<()> {
        self.with_node(id, "set_node_relative_scale", |n| n.set_relative_scale(delta))
            .unwrap_or(Ok(()))
    }

    // ─── Whole-document ──────────────────────────────────────────────

    /// Remove every node (and with them every edge) and reset the modified
    /// flag without notifying listeners.
    pub fn clear(&mut self) {
        while let Some(id) = self.nodes.first().map(|n| n.id) {
            self.remove_node(id);
        }
        if !self.edges.is_empty() {
            log::warn!("clear: {} edges outlived their nodes", self.edges.len());
            self.edges.clear();
        }
        self.socket_owner.clear();
        self.modified = false;
    }

    /// Swap in the graph of `staged`, keeping listeners and the modified flag.
    pub(crate) fn replace_graph(&mut self, staged: Document) {
        self.id = staged.id;
        self.width = staged.width;
        self.height = staged.height;
        self.nodes = staged.nodes;
        self.edges = staged.edges;
        self.socket_owner = staged.socket_owner;
    }

    // ─── Modified flag ───────────────────────────────────────────────

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.set_modified(true);
    }

    /// Listeners run once per clean → dirty transition.
    pub fn set_modified(&mut self, modified: bool) {
        if !self.modified && modified {
            self.modified = true;
            for listener in &mut self.modified_listeners {
                listener();
            }
        }
        self.modified = modified;
    }

    pub fn add_modified_listener(&mut self, listener: impl FnMut() + 'static) {
        self.modified_listeners.push(Box::new(listener));
    }

    // ─── Persistence ─────────────────────────────────────────────────

    pub fn save_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serializer::to_json(self)?;
        std::fs::write(path, json)?;
        log::debug!("saved {} to {}", self.id, path.display());
        self.modified = false;
        Ok(())
    }

    /// Replace the whole graph with the contents of `path`. On any failure
    /// the document is left exactly as it was.
    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let data = serializer::from_json(&raw)?;
        serializer::deserialize(&data, self, true)?;
        log::debug!("loaded {} from {}", self.id, path.display());
        self.modified = false;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("nodes", &self.nodes)
            .field("edges", &self.edges)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}
