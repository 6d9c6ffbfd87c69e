use std::collections::VecDeque;

use crate::model::Document;

use super::Selection;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    doc: Document,
    selection: Selection,
}

/// Linear undo/redo of whole-document snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Entry>,
    redo: Vec<Entry>,
    depth: usize,
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth,
        }
    }

    /// Remember the state before a document change. Clears the redo stack.
    pub fn record(&mut self, doc: &Document, selection: Selection) {
        if self.depth == 0 {
            return;
        }
        if self.undo.len() == self.depth {
            self.undo.pop_front();
        }
        self.undo.push_back(Entry {
            doc: doc.clone(),
            selection,
        });
        self.redo.clear();
    }

    /// Swap `current` for the previous state.
    pub fn undo(&mut self, current: (&Document, Selection)) -> Option<(Document, Selection)> {
        let entry = self.undo.pop_back()?;
        self.redo.push(Entry {
            doc: current.0.clone(),
            selection: current.1,
        });
        Some((entry.doc, entry.selection))
    }

    pub fn redo(&mut self, current: (&Document, Selection)) -> Option<(Document, Selection)> {
        let entry = self.redo.pop()?;
        self.undo.push_back(Entry {
            doc: current.0.clone(),
            selection: current.1,
        });
        Some((entry.doc, entry.selection))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockNode;

    fn doc(text: &str) -> Document {
        Document::new(vec![BlockNode::paragraph(text)])
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new(10);
        history.record(&doc("a"), Selection::caret(2));
        assert!(history.can_undo());

        let (previous, selection) = history.undo((&doc("ab"), Selection::caret(3))).unwrap();
        assert_eq!(previous, doc("a"));
        assert_eq!(selection, Selection::caret(2));
        assert!(history.can_redo());

        let (next, _) = history.redo((&previous, selection)).unwrap();
        assert_eq!(next, doc("ab"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_depth_is_bounded() {
        let mut history = History::new(2);
        for text in ["a", "b", "c"] {
            history.record(&doc(text), Selection::caret(1));
        }
        let current = doc("d");
        let (first, _) = history.undo((&current, Selection::caret(1))).unwrap();
        let (second, _) = history.undo((&first, Selection::caret(1))).unwrap();
        assert_eq!(second, doc("b"));
        assert!(history.undo((&second, Selection::caret(1))).is_none());
    }

    #[test]
    fn test_new_change_clears_redo() {
        let mut history = History::new(10);
        history.record(&doc("a"), Selection::caret(1));
        history.undo((&doc("b"), Selection::caret(1)));
        history.record(&doc("a"), Selection::caret(1));
        assert!(!history.can_redo());
    }
}
