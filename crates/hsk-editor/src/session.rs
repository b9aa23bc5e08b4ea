//! Editing session: one open document plus everything needed to edit it.
//!
//! The session is the single entry point for hosts. It owns the document,
//! its history, the selection, the interaction tools and a text clipboard
//! buffer, and routes input events between them:
//!
//! - **Pointer events** go to an active gesture first (connect drag, cut
//!   stroke), then to the tools that may start one, then to selection and
//!   node dragging.
//! - **Key events** resolve through [`ShortcutMap`]; editing actions run
//!   directly, file actions are handed back to the host, which owns the
//!   file dialogs.

use crate::clipboard::{self, ClipboardData};
use crate::demo;
use crate::history::{DEFAULT_HISTORY_DEPTH, History};
use crate::input::InputEvent;
use crate::selection::{Selectable, Selection};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{ConnectTool, CutTool, Hit, Tool};
use hsk_core::{Document, DocumentError, NodeId, Point, Result};
use std::path::{Path, PathBuf};

/// Rotation applied by the rotate shortcut, degrees clockwise.
pub const ROTATE_STEP: f64 = 90.0;
/// Relative scale step applied by the scale shortcuts.
pub const SCALE_STEP: f64 = 0.01;

pub struct EditorSession {
    doc: Document,
    history: History,
    selection: Selection,
    connect: ConnectTool,
    cut: CutTool,
    /// Last copied or cut payload, as clipboard text.
    clipboard: Option<String>,
    filename: Option<PathBuf>,
    /// Last pointer position of an ongoing node drag.
    drag_from: Option<Point>,
    /// Last known pointer position, used as the paste anchor for shortcuts.
    pointer: Point,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self::with_history_depth(DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_history_depth(depth: usize) -> Self {
        let doc = Document::new();
        let history = History::new(&doc, depth);
        Self {
            doc,
            history,
            selection: Selection::new(),
            connect: ConnectTool::new(),
            cut: CutTool::new(),
            clipboard: None,
            filename: None,
            drag_from: None,
            pointer: Point::ZERO,
        }
    }

    /// A session opened on the starter scene.
    pub fn with_demo() -> Result<Self> {
        let mut session = Self::new();
        demo::populate_demo(&mut session.doc)?;
        session.reset_history();
        Ok(session)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct document access. Changes made here are not recorded; follow
    /// up with [`EditorSession::store_history`] to make them undoable.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn connect_tool(&self) -> &ConnectTool {
        &self.connect
    }

    pub fn cut_tool(&self) -> &CutTool {
        &self.cut
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn store_history(&mut self, description: &str) -> Result<()> {
        self.history.store_history(&mut self.doc, description, true)
    }

    fn reset_history(&mut self) {
        self.history.reset(&self.doc);
    }

    /// Abandon any gesture in progress.
    pub fn cancel_gestures(&mut self) {
        self.connect.cancel(&mut self.doc);
        self.cut.cancel(&mut self.doc);
        if self.drag_from.take().is_some() {
            if let Err(err) = self.history.end_batch(&self.doc) {
                log::error!("closing drag batch failed: {err}");
            }
        }
    }

    // ─── Files ───────────────────────────────────────────────────────

    pub fn file_new(&mut self) {
        self.cancel_gestures();
        self.doc.clear();
        self.filename = None;
        self.selection.clear();
        self.reset_history();
    }

    /// Open `path`. On failure the current document stays open untouched.
    pub fn file_load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.cancel_gestures();
        self.doc.load_from_file(path)?;
        self.filename = Some(path.to_path_buf());
        self.selection.clear();
        self.reset_history();
        log::debug!("opened {}", path.display());
        Ok(())
    }

    /// Save to `path`, or to the current file name when `None`.
    pub fn file_save(&mut self, path: Option<&Path>) -> Result<()> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.filename.clone().ok_or_else(|| {
                DocumentError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "no file name set",
                ))
            })?,
        };
        self.doc.save_to_file(&target)?;
        self.filename = Some(target);
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.doc.is_modified()
    }

    /// Title-bar name: the file's base name (or "New Graph"), with a `*`
    /// while there are unsaved changes.
    pub fn user_friendly_filename(&self) -> String {
        let name = self
            .filename
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "New Graph".to_string());
        if self.is_modified() {
            name + "*"
        } else {
            name
        }
    }

    // ─── Selection actions ───────────────────────────────────────────

    /// Remove every selected node and edge as one step.
    pub fn delete_selected(&mut self) -> Result<()> {
        let edges = self.selection.edges(&self.doc);
        let nodes = self.selection.nodes(&self.doc);
        if edges.is_empty() && nodes.is_empty() {
            return Ok(());
        }
        for id in edges {
            if self.doc.contains_edge(id) {
                self.doc.remove_edge(id);
            }
        }
        for id in nodes {
            self.doc.remove_node(id);
        }
        self.selection.clear();
        self.store_history("Delete selected")
    }

    pub fn rotate_selected(&mut self, degrees: f64) -> Result<()> {
        let nodes = self.selection.nodes(&self.doc);
        if nodes.is_empty() {
            return Ok(());
        }
        for id in nodes {
            self.doc.rotate_node(id, degrees);
        }
        self.store_history("Rotate selected")
    }

    /// Grow or shrink every selected node by `delta`. Rejected as a whole
    /// when any node would end up with a non-positive scale.
    pub fn scale_selected(&mut self, delta: f64) -> Result<()> {
        let nodes = self.selection.nodes(&self.doc);
        if nodes.is_empty() {
            return Ok(());
        }
        for id in &nodes {
            if let Some(node) = self.doc.node(*id) {
                let next = node.scale() + delta;
                if !(next.is_finite() && next > 0.0) {
                    return Err(DocumentError::InvalidScale(next));
                }
            }
        }
        for id in nodes {
            self.doc.set_node_relative_scale(id, delta)?;
        }
        self.store_history("Scale selected")
    }

    /// Translate every selected node. Inside a drag gesture all moves
    /// collapse into one step.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> Result<()> {
        let nodes = self.selection.nodes(&self.doc);
        if nodes.is_empty() {
            return Ok(());
        }
        for id in nodes {
            self.doc.move_node(id, hsk_core::Vec2::new(dx, dy));
        }
        self.store_history("Move selected")
    }

    // ─── Clipboard ───────────────────────────────────────────────────

    /// Copy the selection. Returns the clipboard text for the host's system
    /// clipboard.
    pub fn copy(&mut self) -> Result<String> {
        let data = clipboard::serialize_selected(
            &mut self.doc,
            &mut self.selection,
            &mut self.history,
            false,
        )?;
        self.keep_clipboard(&data)
    }

    /// Copy the selection, then remove it as one step.
    pub fn cut(&mut self) -> Result<String> {
        let data = clipboard::serialize_selected(
            &mut self.doc,
            &mut self.selection,
            &mut self.history,
            true,
        )?;
        self.keep_clipboard(&data)
    }

    fn keep_clipboard(&mut self, data: &ClipboardData) -> Result<String> {
        let text = data.to_text()?;
        self.clipboard = Some(text.clone());
        Ok(text)
    }

    /// Paste the internal clipboard centred on `anchor`. The pasted nodes
    /// become the selection.
    pub fn paste(&mut self, anchor: Point) -> Result<Vec<NodeId>> {
        match self.clipboard.clone() {
            Some(text) => self.paste_text(&text, anchor),
            None => Ok(Vec::new()),
        }
    }

    /// Paste clipboard text from any source.
    pub fn paste_text(&mut self, text: &str, anchor: Point) -> Result<Vec<NodeId>> {
        let data = ClipboardData::from_text(text)?;
        let added =
            clipboard::deserialize_from_clipboard(&data, &mut self.doc, &mut self.history, anchor)?;
        if !added.is_empty() {
            self.selection
                .replace(added.iter().copied().map(Selectable::Node));
        }
        Ok(added)
    }

    // ─── History ─────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        self.cancel_gestures();
        let description = self.history.undo(&mut self.doc);
        self.selection.retain_existing(&self.doc);
        description
    }

    pub fn redo(&mut self) -> Option<String> {
        self.cancel_gestures();
        let description = self.history.redo(&mut self.doc);
        self.selection.retain_existing(&self.doc);
        description
    }

    // ─── Input ───────────────────────────────────────────────────────

    /// Route one input event. `hit` is what the host found under the
    /// pointer. File shortcuts (new, open, save) are returned for the host
    /// to complete; everything else is handled here.
    pub fn handle(&mut self, event: &InputEvent, hit: Hit) -> Result<Option<ShortcutAction>> {
        if let InputEvent::Key { key, modifiers } = event {
            return match ShortcutMap::resolve(key, *modifiers) {
                Some(action) => self.perform(action),
                None => Ok(None),
            };
        }
        if let Some(pos) = event.position() {
            self.pointer = pos;
        }

        if self.connect.is_active() {
            self.connect.handle(event, hit, &mut self.doc, &mut self.history)?;
            return Ok(None);
        }
        if self.cut.is_active() {
            self.cut.handle(event, hit, &mut self.doc, &mut self.history)?;
            return Ok(None);
        }
        if self.connect.handle(event, hit, &mut self.doc, &mut self.history)?
            || self.cut.handle(event, hit, &mut self.doc, &mut self.history)?
        {
            return Ok(None);
        }

        self.handle_select(event, hit)?;
        Ok(None)
    }

    fn handle_select(&mut self, event: &InputEvent, hit: Hit) -> Result<()> {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => match hit {
                Hit::Node(id) => {
                    self.selection
                        .handle_interaction(Selectable::Node(id), modifiers.shift);
                    if self.selection.contains_node(id) {
                        // A press without a release keeps the open drag batch.
                        if self.drag_from.is_none() {
                            self.history.begin_batch();
                        }
                        self.drag_from = Some(Point::new(*x, *y));
                    }
                }
                Hit::Edge(id) => self
                    .selection
                    .handle_interaction(Selectable::Edge(id), modifiers.shift),
                Hit::Empty if !modifiers.shift => self.selection.clear(),
                _ => {}
            },
            InputEvent::PointerMove { x, y, .. } => {
                if let Some(from) = self.drag_from {
                    let to = Point::new(*x, *y);
                    self.drag_from = Some(to);
                    self.move_selected(to.x - from.x, to.y - from.y)?;
                }
            }
            InputEvent::PointerUp { .. } => {
                if self.drag_from.take().is_some() {
                    self.history.end_batch(&self.doc)?;
                }
            }
            InputEvent::Key { .. } => {}
        }
        Ok(())
    }

    fn perform(&mut self, action: ShortcutAction) -> Result<Option<ShortcutAction>> {
        match action {
            ShortcutAction::New | ShortcutAction::Open | ShortcutAction::Save => {
                return Ok(Some(action));
            }
            ShortcutAction::Undo => {
                self.undo();
            }
            ShortcutAction::Redo => {
                self.redo();
            }
            ShortcutAction::Delete => self.delete_selected()?,
            ShortcutAction::Copy => {
                self.copy()?;
            }
            ShortcutAction::Cut => {
                self.cut()?;
            }
            ShortcutAction::Paste => {
                self.paste(self.pointer)?;
            }
            ShortcutAction::RotateClockwise => self.rotate_selected(ROTATE_STEP)?,
            ShortcutAction::ScaleUp => self.scale_selected(SCALE_STEP)?,
            ShortcutAction::ScaleDown => self.scale_selected(-SCALE_STEP)?,
            ShortcutAction::Cancel => self.cancel_gestures(),
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use hsk_core::NodeKind;

    #[test]
    fn friendly_filename_tracks_name_and_dirty_flag() {
        let mut session = EditorSession::new();
        assert_eq!(session.user_friendly_filename(), "New Graph");

        session.document_mut().create_node(NodeKind::Pump, 0.0, 0.0);
        session.store_history("Add pump").unwrap();
        assert_eq!(session.user_friendly_filename(), "New Graph*");

        let path = std::env::temp_dir().join(format!("hsk-session-{}.json", std::process::id()));
        session.file_save(Some(path.as_path())).unwrap();
        let expected = path.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(session.user_friendly_filename(), expected);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn save_without_name_is_rejected() {
        let mut session = EditorSession::new();
        assert!(matches!(session.file_save(None), Err(DocumentError::Io(_))));
    }

    #[test]
    fn node_drag_is_one_undo_step() {
        let mut session = EditorSession::new();
        let node = session.document_mut().create_node(NodeKind::Gauge, 0.0, 0.0);
        session.store_history("Add gauge").unwrap();

        session.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Node(node)).unwrap();
        for step in 1..=4 {
            let x = step as f64 * 25.0;
            session.handle(&InputEvent::pointer_move(x, 0.0), Hit::Node(node)).unwrap();
        }
        session.handle(&InputEvent::pointer_up(100.0, 0.0), Hit::Node(node)).unwrap();

        assert_eq!(session.document().node(node).unwrap().position(), Point::new(100.0, 0.0));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.undo().as_deref(), Some("Move selected"));
        assert_eq!(session.document().node(node).unwrap().position(), Point::ZERO);
    }

    #[test]
    fn repeated_press_does_not_leave_a_batch_open() {
        let mut session = EditorSession::new();
        let node = session.document_mut().create_node(NodeKind::Gauge, 0.0, 0.0);
        session.store_history("Add gauge").unwrap();

        session.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Node(node)).unwrap();
        session.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Node(node)).unwrap();
        session.handle(&InputEvent::pointer_up(0.0, 0.0), Hit::Node(node)).unwrap();
        assert!(!session.history().is_batching());

        session.rotate_selected(90.0).unwrap();
        session.delete_selected().unwrap();
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.undo().as_deref(), Some("Delete selected"));
        assert_eq!(session.undo().as_deref(), Some("Rotate selected"));
        assert_eq!(session.document().node(node).unwrap().rotation(), 0.0);
    }

    #[test]
    fn pressing_a_selected_node_drags_the_whole_group() {
        let mut session = EditorSession::new();
        let a = session.document_mut().create_node(NodeKind::Pump, 0.0, 0.0);
        let b = session.document_mut().create_node(NodeKind::Tank, 500.0, 0.0);
        session.store_history("Add nodes").unwrap();
        let doc = &session.doc;
        session.selection.select_all(doc);

        session.handle(&InputEvent::pointer_down(0.0, 0.0), Hit::Node(a)).unwrap();
        session.handle(&InputEvent::pointer_move(0.0, 50.0), Hit::Node(a)).unwrap();
        session.handle(&InputEvent::pointer_up(0.0, 50.0), Hit::Node(a)).unwrap();

        assert_eq!(session.selection().len(), 2);
        assert_eq!(session.document().node(a).unwrap().position(), Point::new(0.0, 50.0));
        assert_eq!(session.document().node(b).unwrap().position(), Point::new(500.0, 50.0));
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn file_shortcuts_are_handed_back() {
        let mut session = EditorSession::new();
        let save = InputEvent::key("s", Modifiers::CTRL);
        assert_eq!(
            session.handle(&save, Hit::Empty).unwrap(),
            Some(ShortcutAction::Save)
        );
        let undo = InputEvent::key("z", Modifiers::CTRL);
        assert_eq!(session.handle(&undo, Hit::Empty).unwrap(), None);
    }

    #[test]
    fn scale_rejects_collapse_for_the_whole_selection() {
        let mut session = EditorSession::new();
        let a = session.document_mut().create_node(NodeKind::Pump, 0.0, 0.0);
        let b = session.document_mut().create_node(NodeKind::Pump, 0.0, 0.0);
        session.document_mut().set_node_absolute_scale(b, 0.5).unwrap();
        session.selection_mut().handle_interaction(Selectable::Node(a), false);
        session.selection_mut().insert(Selectable::Node(b));

        assert!(session.scale_selected(-0.75).is_err());
        assert_eq!(session.document().node(a).unwrap().scale(), 1.0);
        assert_eq!(session.document().node(b).unwrap().scale(), 0.5);
    }
}
