use crate::model::{BlockKind, Document, MarkSet, MarkType, inline};

use super::Selection;

/// Everything a command reads: the document, the selection and the marks the
/// next typed character will carry.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub doc: Document,
    pub selection: Selection,
    /// Explicit marks for the next insertion at a caret, set by toggling a
    /// mark with nothing selected.
    pub stored_marks: Option<MarkSet>,
}

impl EditorState {
    pub fn new(doc: Document) -> Self {
        let selection = Selection::at_start(&doc);
        Self {
            doc,
            selection,
            stored_marks: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self.stored_marks = None;
        self
    }

    /// Marks that text typed at the caret would receive.
    pub fn caret_marks(&self) -> MarkSet {
        if let Some(marks) = &self.stored_marks {
            return marks.clone();
        }
        self.doc
            .textblock_at(self.selection.from())
            .and_then(|(block, offset)| {
                let node = self.doc.node_at(&block.path)?;
                Some(inline::marks_at(node.runs()?, offset))
            })
            .unwrap_or_default()
    }

    /// Whether `ty` is active at the caret, or across the whole selection.
    pub fn is_mark_active(&self, ty: MarkType) -> bool {
        if self.selection.is_empty() {
            return self.caret_marks().contains(ty);
        }
        let mut covered = false;
        for block in self.doc.textblocks() {
            let lo = self.selection.from().max(block.content_start());
            let hi = self.selection.to().min(block.content_end());
            if lo >= hi {
                continue;
            }
            // Text that cannot carry marks has no say.
            let Some(runs) = self
                .doc
                .node_at(&block.path)
                .filter(|node| node.kind.allows_marks())
                .and_then(|node| node.runs())
            else {
                continue;
            };
            match inline::range_has_mark(runs, lo - block.content_start(), hi - block.content_start(), ty) {
                Some(false) => return false,
                Some(true) => covered = true,
                None => {}
            }
        }
        covered
    }

    /// Kind of the textblock holding the caret.
    pub fn active_block(&self) -> Option<&BlockKind> {
        let (block, _) = self.doc.textblock_at(self.selection.from())?;
        self.doc.node_at(&block.path).map(|node| &node.kind)
    }

    pub fn in_table(&self) -> bool {
        self.doc
            .textblock_at(self.selection.from())
            .and_then(|(block, _)| self.doc.ancestor_where(&block.path, BlockKind::is_cell))
            .is_some()
    }
}

/// The outcome of a command: a new state plus whether the document changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub(crate) state: EditorState,
    pub(crate) doc_changed: bool,
}

impl Transaction {
    /// A document change; the selection is normalized and stored marks reset.
    pub(crate) fn doc_change(doc: Document, selection: Selection) -> Self {
        let selection = selection.normalize(&doc);
        Self {
            state: EditorState {
                doc,
                selection,
                stored_marks: None,
            },
            doc_changed: true,
        }
    }

    /// Only the stored marks change.
    pub(crate) fn stored_marks(state: &EditorState, marks: MarkSet) -> Self {
        Self {
            state: EditorState {
                stored_marks: Some(marks),
                ..state.clone()
            },
            doc_changed: false,
        }
    }

    pub fn doc(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn doc_changed(&self) -> bool {
        self.doc_changed
    }

    pub fn into_state(self) -> EditorState {
        self.state
    }
}
