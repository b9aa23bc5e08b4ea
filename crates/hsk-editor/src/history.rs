//! Undo/Redo history of whole-document snapshots.
//!
//! Every undoable action ends with [`History::store_history`], which
//! captures the complete document (MessagePack-encoded) *after* the action.
//! The state before the first retained entry is kept as a baseline, taken
//! from the document the history is created for, so the oldest retained
//! action can always be undone.
//!
//! Drag gestures use **batching**: every store between `begin_batch` and
//! the outermost `end_batch` collapses into one step.

use hsk_core::serializer::{self, DocumentData};
use hsk_core::{Document, DocumentError, Result};

pub const DEFAULT_HISTORY_DEPTH: usize = 32;

/// One undoable step: the document as it was right after the action.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub description: String,
    snapshot: Vec<u8>,
}

pub struct History {
    entries: Vec<HistoryEntry>,
    /// Number of applied entries; `entries[cursor - 1]` is the live state.
    cursor: usize,
    /// State preceding `entries[0]`.
    baseline: DocumentData,
    /// Maximum number of retained entries.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Description of the first store inside the current batch.
    batch_description: Option<String>,
}

impl History {
    /// Start an empty history whose baseline is the current state of `doc`.
    pub fn new(doc: &Document, max_depth: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_depth),
            cursor: 0,
            baseline: serializer::serialize(doc),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_description: None,
        }
    }

    /// Drop every entry and take `doc` as the new starting point.
    pub fn reset(&mut self, doc: &Document) {
        self.entries.clear();
        self.cursor = 0;
        self.batch_depth = 0;
        self.batch_description = None;
        self.baseline = serializer::serialize(doc);
        log::debug!("history reset");
    }

    /// Record the current state of `doc` as one undoable step. Any redoable
    /// future is discarded.
    pub fn store_history(
        &mut self,
        doc: &mut Document,
        description: &str,
        set_modified: bool,
    ) -> Result<()> {
        if set_modified {
            doc.mark_modified();
        }
        if self.batch_depth > 0 {
            self.batch_description
                .get_or_insert_with(|| description.to_string());
            return Ok(());
        }
        self.push(doc, description)
    }

    fn push(&mut self, doc: &Document, description: &str) -> Result<()> {
        let snapshot = encode(doc)?;
        self.entries.truncate(self.cursor);
        self.entries.push(HistoryEntry {
            description: description.to_string(),
            snapshot,
        });
        self.cursor += 1;
        if self.entries.len() > self.max_depth {
            let evicted = self.entries.remove(0);
            self.baseline = decode(&evicted.snapshot)?;
            self.cursor -= 1;
        }
        log::debug!(
            "history: stored {description:?} ({}/{})",
            self.cursor,
            self.entries.len()
        );
        Ok(())
    }

    /// Start a batch group. Stores until the matching `end_batch()` are
    /// merged into one step.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes, push one entry if
    /// anything was stored inside it.
    pub fn end_batch(&mut self, doc: &Document) -> Result<()> {
        if self.batch_depth == 0 {
            return Ok(());
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return Ok(());
        }
        match self.batch_description.take() {
            Some(description) => self.push(doc, &description),
            None => Ok(()),
        }
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Step back one entry. Returns the description of the undone action,
    /// or `None` at the bottom of the stack.
    pub fn undo(&mut self, doc: &mut Document) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        let restored = match self.cursor {
            1 => serializer::deserialize(&self.baseline, doc, true),
            n => restore(&self.entries[n - 2].snapshot, doc),
        };
        if let Err(err) = restored {
            log::error!("undo failed: {err}");
            return None;
        }
        self.cursor -= 1;
        doc.mark_modified();
        let description = self.entries[self.cursor].description.clone();
        log::debug!("history: undo {description:?}");
        Some(description)
    }

    /// Re-apply the next entry. Returns its description, or `None` when
    /// there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Option<String> {
        let entry = self.entries.get(self.cursor)?;
        if let Err(err) = restore(&entry.snapshot, doc) {
            log::error!("redo failed: {err}");
            return None;
        }
        let description = entry.description.clone();
        self.cursor += 1;
        doc.mark_modified();
        log::debug!("history: redo {description:?}");
        Some(description)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

fn encode(doc: &Document) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(&serializer::serialize(doc))
        .map_err(|err| DocumentError::Snapshot(err.to_string()))
}

fn decode(snapshot: &[u8]) -> Result<DocumentData> {
    rmp_serde::from_slice(snapshot).map_err(|err| DocumentError::Snapshot(err.to_string()))
}

fn restore(snapshot: &[u8], doc: &mut Document) -> Result<()> {
    serializer::deserialize(&decode(snapshot)?, doc, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hsk_core::NodeKind;

    #[test]
    fn boundaries_are_no_ops() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 4);
        assert!(!history.can_undo());
        assert_eq!(history.undo(&mut doc), None);
        assert_eq!(history.redo(&mut doc), None);
    }

    #[test]
    fn first_action_after_construction_can_be_undone() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 3);
        let before = serializer::serialize(&doc);

        doc.create_node(NodeKind::Pump, 0.0, 0.0);
        history.store_history(&mut doc, "add pump", true).unwrap();

        assert_eq!(history.undo(&mut doc).as_deref(), Some("add pump"));
        assert!(doc.nodes().is_empty());
        assert_eq!(serializer::serialize(&doc), before);
    }

    #[test]
    fn reset_moves_the_baseline() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 3);
        let pump = doc.create_node(NodeKind::Pump, 0.0, 0.0);
        history.reset(&doc);
        assert!(!history.can_undo());

        doc.create_node(NodeKind::Tank, 0.0, 0.0);
        history.store_history(&mut doc, "add tank", true).unwrap();
        history.undo(&mut doc);
        assert_eq!(doc.node_ids(), vec![pump]);
    }

    #[test]
    fn store_after_undo_discards_redo_tail() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 8);

        doc.create_node(NodeKind::Pump, 0.0, 0.0);
        history.store_history(&mut doc, "first", true).unwrap();
        doc.create_node(NodeKind::Filter, 0.0, 0.0);
        history.store_history(&mut doc, "second", true).unwrap();

        assert_eq!(history.undo(&mut doc).as_deref(), Some("second"));
        assert!(history.can_redo());

        doc.create_node(NodeKind::Gauge, 0.0, 0.0);
        history.store_history(&mut doc, "third", true).unwrap();
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.entries()[1].description, "third");
    }

    #[test]
    fn batch_collapses_into_one_step() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 8);
        let node = doc.create_node(NodeKind::Pump, 0.0, 0.0);
        history.store_history(&mut doc, "add", true).unwrap();

        history.begin_batch();
        history.begin_batch();
        for step in 1..=5 {
            doc.set_node_position(node, step as f64 * 10.0, 0.0);
            history.store_history(&mut doc, "move", true).unwrap();
        }
        history.end_batch(&doc).unwrap();
        assert_eq!(history.len(), 1);
        history.end_batch(&doc).unwrap();
        assert_eq!(history.len(), 2);

        assert_eq!(history.undo(&mut doc).as_deref(), Some("move"));
        assert_eq!(doc.node(node).unwrap().position().x, 0.0);
    }

    #[test]
    fn empty_batch_records_nothing() {
        let doc = Document::new();
        let mut history = History::new(&doc, 8);
        history.begin_batch();
        history.end_batch(&doc).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn undo_and_redo_mark_the_document_modified() {
        let mut doc = Document::new();
        let mut history = History::new(&doc, 8);
        doc.create_node(NodeKind::Tank, 0.0, 0.0);
        history.store_history(&mut doc, "add", false).unwrap();
        assert!(!doc.is_modified());

        history.undo(&mut doc);
        assert!(doc.is_modified());
        assert!(doc.nodes().is_empty());
    }
}
