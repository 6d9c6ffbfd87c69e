use crate::error::CommandError;
use crate::model::{Document, TextPoint};

/// A text selection as an ordered pair of document positions.
///
/// `from == to` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    from: usize,
    to: usize,
}

impl Selection {
    pub fn caret(pos: usize) -> Self {
        Self { from: pos, to: pos }
    }

    /// A selection between two positions in either order.
    pub fn range(anchor: usize, head: usize) -> Self {
        Self {
            from: anchor.min(head),
            to: anchor.max(head),
        }
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to(&self) -> usize {
        self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Caret at the text position closest to `pos`, searching forward first.
    pub fn near(doc: &Document, pos: usize) -> Self {
        Self::caret(doc.nearest_text_pos(pos, true))
    }

    /// A caret at the start of the first textblock.
    pub fn at_start(doc: &Document) -> Self {
        Self::near(doc, 0)
    }

    pub fn validate(&self, doc: &Document) -> Result<(), CommandError> {
        let size = doc.content_size();
        if self.to > size {
            return Err(CommandError::InvalidRange {
                from: self.from,
                to: self.to,
                size,
            });
        }
        Ok(())
    }

    /// Move both ends into textblock content.
    pub fn normalize(self, doc: &Document) -> Self {
        let size = doc.content_size();
        let from = doc.nearest_text_pos(self.from.min(size), true);
        if self.is_empty() {
            return Self::caret(from);
        }
        let to = doc.nearest_text_pos(self.to.min(size), false);
        if to <= from {
            Self::caret(from)
        } else {
            Self { from, to }
        }
    }

    /// Shift positions at or after `at` by `delta` (insertions).
    pub(crate) fn map_insert(self, at: usize, delta: isize) -> Self {
        let map = |pos: usize| {
            if pos >= at {
                pos.saturating_add_signed(delta)
            } else {
                pos
            }
        };
        Self::range(map(self.from), map(self.to))
    }

    /// Map through the deletion of `from..to`, which shrank the document by
    /// `removed` positions.
    pub(crate) fn map_delete(self, from: usize, to: usize, removed: usize) -> Self {
        let map = |pos: usize| {
            if pos <= from {
                pos
            } else if pos >= to {
                pos - removed
            } else {
                from
            }
        };
        Self::range(map(self.from), map(self.to))
    }

    pub(crate) fn points(&self, doc: &Document) -> Option<(TextPoint, TextPoint)> {
        Some((doc.text_point(self.from)?, doc.text_point(self.to)?))
    }

    pub(crate) fn from_points(doc: &Document, (from, to): (TextPoint, TextPoint)) -> Option<Self> {
        Some(Self::range(doc.pos_at_point(from)?, doc.pos_at_point(to)?))
    }
}
