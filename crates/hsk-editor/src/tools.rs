//! Tool system for canvas interactions.
//!
//! Each tool is a small state machine fed with [`InputEvent`]s plus the
//! result of the host's hit test. Tools mutate the document directly and
//! record exactly one history step per completed gesture.
//!
//! | Gesture | Tool |
//! |---------|------|
//! | Press on a socket, drag, release on another socket | [`ConnectTool`] |
//! | Click a socket, click another socket | [`ConnectTool`] |
//! | **Ctrl** + press on empty space, drag across edges | [`CutTool`] |

use crate::history::History;
use crate::input::InputEvent;
use hsk_core::geometry::polyline_crosses_path;
use hsk_core::{Document, EdgeId, EdgeStyle, NodeId, Point, Result, SocketId};

/// Distance (scene units) the pointer must travel between press and release
/// for the release to end a connect drag. Shorter releases keep the drag
/// alive until the next press.
pub const EDGE_DRAG_START_THRESHOLD: f64 = 10.0;

/// What lies under the pointer, as reported by the host's hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hit {
    #[default]
    Empty,
    Node(NodeId),
    Socket(SocketId),
    Edge(EdgeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Connect,
    Cut,
}

pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Whether a gesture is in progress.
    fn is_active(&self) -> bool;

    /// Handle an input event. Returns `true` when the event was consumed.
    fn handle(
        &mut self,
        event: &InputEvent,
        hit: Hit,
        doc: &mut Document,
        history: &mut History,
    ) -> Result<bool>;

    /// Abandon the current gesture without leaving anything behind.
    fn cancel(&mut self, doc: &mut Document);
}

// ─── Connect Tool ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum ConnectState {
    Idle,
    Dragging {
        start: SocketId,
        provisional: EdgeId,
        pressed_at: Point,
    },
}

/// Drag-to-connect: a provisional edge follows the pointer from the start
/// socket until it is dropped on another socket.
pub struct ConnectTool {
    state: ConnectState,
    /// Style of the edges this tool creates.
    pub style: EdgeStyle,
    pub threshold: f64,
}

impl Default for ConnectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectTool {
    pub fn new() -> Self {
        Self {
            state: ConnectState::Idle,
            style: EdgeStyle::Orthogonal,
            threshold: EDGE_DRAG_START_THRESHOLD,
        }
    }

    /// The edge currently following the pointer, if any.
    pub fn provisional_edge(&self) -> Option<EdgeId> {
        match self.state {
            ConnectState::Dragging { provisional, .. } => Some(provisional),
            ConnectState::Idle => None,
        }
    }

    fn start(&mut self, socket: SocketId, at: Point, doc: &mut Document) -> Result<()> {
        let provisional = doc.add_edge(socket, None, self.style)?;
        doc.set_edge_free_end(provisional, at);
        self.state = ConnectState::Dragging {
            start: socket,
            provisional,
            pressed_at: at,
        };
        log::debug!("connect: drag from {socket}");
        Ok(())
    }

    fn finish(&mut self, hit: Hit, doc: &mut Document, history: &mut History) -> Result<()> {
        let ConnectState::Dragging {
            start, provisional, ..
        } = std::mem::replace(&mut self.state, ConnectState::Idle)
        else {
            return Ok(());
        };
        doc.remove_edge(provisional);

        match hit {
            Hit::Socket(end) if end != start => {
                let edge = doc.add_edge(start, Some(end), self.style)?;
                history.store_history(doc, "Created new edge by dragging", true)?;
                log::debug!("connect: {edge} {start} -> {end}");
            }
            _ => log::debug!("connect: dropped on {hit:?}, discarded"),
        }
        Ok(())
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn is_active(&self) -> bool {
        matches!(self.state, ConnectState::Dragging { .. })
    }

    fn handle(
        &mut self,
        event: &InputEvent,
        hit: Hit,
        doc: &mut Document,
        history: &mut History,
    ) -> Result<bool> {
        match (event, self.state) {
            (InputEvent::PointerDown { x, y, .. }, ConnectState::Idle) => match hit {
                Hit::Socket(socket) => {
                    self.start(socket, Point::new(*x, *y), doc)?;
                    Ok(true)
                }
                _ => Ok(false),
            },
            // Second click of a click-click connect.
            (InputEvent::PointerDown { .. }, ConnectState::Dragging { .. }) => {
                self.finish(hit, doc, history)?;
                Ok(true)
            }
            (InputEvent::PointerMove { x, y, .. }, ConnectState::Dragging { provisional, .. }) => {
                doc.set_edge_free_end(provisional, Point::new(*x, *y));
                log::trace!("connect: free end at ({x:.1}, {y:.1})");
                Ok(true)
            }
            (InputEvent::PointerUp { x, y, .. }, ConnectState::Dragging { pressed_at, .. }) => {
                if Point::new(*x, *y).distance(pressed_at) < self.threshold {
                    log::trace!("connect: short release, waiting for second click");
                    return Ok(true);
                }
                self.finish(hit, doc, history)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn cancel(&mut self, doc: &mut Document) {
        if let ConnectState::Dragging { provisional, .. } =
            std::mem::replace(&mut self.state, ConnectState::Idle)
        {
            doc.remove_edge(provisional);
            log::debug!("connect: cancelled");
        }
    }
}

// ─── Cut Tool ────────────────────────────────────────────────────────────

/// Ctrl-drag stroke that deletes every edge it crosses.
#[derive(Debug, Default)]
pub struct CutTool {
    /// Stroke gathered so far, in scene coordinates.
    pub line_points: Vec<Point>,
    active: bool,
}

impl CutTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every edge whose drawn path crosses the stroke. Records one
    /// history step if anything was cut. Returns the number of removed edges.
    pub fn cut_intersecting_edges(&self, doc: &mut Document, history: &mut History) -> Result<usize> {
        let marked: Vec<EdgeId> = doc
            .edges()
            .iter()
            .filter(|e| !e.is_provisional() && polyline_crosses_path(&e.path(), &self.line_points))
            .map(|e| e.id())
            .collect();
        for id in &marked {
            doc.remove_edge(*id);
        }
        if !marked.is_empty() {
            history.store_history(doc, "Delete cutted edges", true)?;
            log::debug!("cut: removed {} edges", marked.len());
        }
        Ok(marked.len())
    }
}

impl Tool for CutTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Cut
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn handle(
        &mut self,
        event: &InputEvent,
        hit: Hit,
        doc: &mut Document,
        history: &mut History,
    ) -> Result<bool> {
        match event {
            InputEvent::PointerDown { x, y, modifiers }
                if !self.active && modifiers.command() && hit == Hit::Empty =>
            {
                self.active = true;
                self.line_points = vec![Point::new(*x, *y)];
                log::debug!("cut: stroke started");
                Ok(true)
            }
            InputEvent::PointerMove { x, y, .. } if self.active => {
                self.line_points.push(Point::new(*x, *y));
                log::trace!("cut: stroke at ({x:.1}, {y:.1})");
                Ok(true)
            }
            InputEvent::PointerUp { x, y, .. } if self.active => {
                self.line_points.push(Point::new(*x, *y));
                let outcome = self.cut_intersecting_edges(doc, history);
                self.active = false;
                self.line_points.clear();
                outcome.map(|_| true)
            }
            _ => Ok(false),
        }
    }

    fn cancel(&mut self, _doc: &mut Document) {
        self.active = false;
        self.line_points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use hsk_core::NodeKind;

    fn two_sockets() -> (Document, SocketId, SocketId) {
        let mut doc = Document::new();
        let a = doc.create_node(NodeKind::Pump, 0.0, 0.0);
        let b = doc.create_node(NodeKind::Tank, 2000.0, 0.0);
        let sa = doc.node(a).unwrap().sockets()[0].id();
        let sb = doc.node(b).unwrap().sockets()[0].id();
        (doc, sa, sb)
    }

    #[test]
    fn pointer_move_tracks_free_end() {
        let (mut doc, sa, _) = two_sockets();
        let mut history = History::new(&doc, 4);
        let mut tool = ConnectTool::new();

        tool.handle(&InputEvent::pointer_down(0.0, -300.0), Hit::Socket(sa), &mut doc, &mut history)
            .unwrap();
        let edge = tool.provisional_edge().unwrap();
        tool.handle(&InputEvent::pointer_move(500.0, 40.0), Hit::Empty, &mut doc, &mut history)
            .unwrap();

        assert_eq!(doc.edge(edge).unwrap().destination(), Point::new(500.0, 40.0));
        assert!(doc.edge(edge).unwrap().is_provisional());
    }

    #[test]
    fn release_on_same_socket_discards() {
        let (mut doc, sa, _) = two_sockets();
        let mut history = History::new(&doc, 4);
        let mut tool = ConnectTool::new();

        tool.handle(&InputEvent::pointer_down(0.0, -300.0), Hit::Socket(sa), &mut doc, &mut history)
            .unwrap();
        tool.handle(&InputEvent::pointer_up(0.0, 300.0), Hit::Socket(sa), &mut doc, &mut history)
            .unwrap();

        assert!(!tool.is_active());
        assert!(doc.edges().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn cancel_removes_provisional_edge() {
        let (mut doc, sa, _) = two_sockets();
        let mut history = History::new(&doc, 4);
        let mut tool = ConnectTool::new();
        tool.handle(&InputEvent::pointer_down(0.0, -300.0), Hit::Socket(sa), &mut doc, &mut history)
            .unwrap();
        tool.cancel(&mut doc);
        assert!(doc.edges().is_empty());
        assert!(!doc.socket(sa).unwrap().has_edges());
    }

    #[test]
    fn cut_requires_ctrl_on_empty_space() {
        let (mut doc, _, _) = two_sockets();
        let mut history = History::new(&doc, 4);
        let mut tool = CutTool::new();
        let plain = InputEvent::pointer_down(10.0, 10.0);
        assert!(!tool.handle(&plain, Hit::Empty, &mut doc, &mut history).unwrap());
        let ctrl = plain.with_modifiers(Modifiers::CTRL);
        assert!(!tool.handle(&ctrl, Hit::Node(NodeId::fresh()), &mut doc, &mut history).unwrap());
        assert!(tool.handle(&ctrl, Hit::Empty, &mut doc, &mut history).unwrap());
        assert!(tool.is_active());
    }
}
