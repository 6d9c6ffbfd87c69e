//! The seam between the engine and whatever displays it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::editing::Selection;
use crate::model::{BlockId, Document};

/// A point relative to the editor's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPosition {
    pub top: f32,
    pub left: f32,
}

/// Rendering services the editor needs from its host.
pub trait EditorSurface {
    /// Bottom-left corner of the caret, used to anchor the palette.
    fn measure_caret(&self, doc: &Document, selection: Selection) -> ScreenPosition;

    /// Show the document as serialized markup.
    fn paint(&mut self, _markup: &str) {}

    fn focus(&mut self) {}

    fn scroll_into_view(&mut self, _pos: usize) {}

    /// Briefly emphasize a block, removing the emphasis after `duration`.
    fn highlight_block(&mut self, _id: &BlockId, _duration: Duration) {}
}

/// A surface without a display: one line per textblock, fixed-width
/// characters. Records what it was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurface {
    pub line_height: f32,
    pub char_width: f32,
    pub paints: usize,
    pub last_paint: Option<String>,
    pub scrolled_to: Vec<usize>,
    pub highlights: Vec<(BlockId, Duration)>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            char_width: 8.0,
            paints: 0,
            last_paint: None,
            scrolled_to: Vec::new(),
            highlights: Vec::new(),
        }
    }
}

impl EditorSurface for HeadlessSurface {
    fn measure_caret(&self, doc: &Document, selection: Selection) -> ScreenPosition {
        let Some(point) = doc.text_point(selection.to()) else {
            return ScreenPosition::default();
        };
        ScreenPosition {
            top: (point.ordinal + 1) as f32 * self.line_height,
            left: point.offset as f32 * self.char_width,
        }
    }

    fn paint(&mut self, markup: &str) {
        self.paints += 1;
        self.last_paint = Some(markup.to_string());
    }

    fn scroll_into_view(&mut self, pos: usize) {
        self.scrolled_to.push(pos);
    }

    fn highlight_block(&mut self, id: &BlockId, duration: Duration) {
        self.highlights.push((id.clone(), duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::markup::parse_markup;

    #[test]
    fn test_headless_caret_measurement() {
        let doc = parse_markup("<p>one</p><p>two</p>").unwrap();
        let surface = HeadlessSurface::default();
        // second paragraph text starts at 6
        let position = surface.measure_caret(&doc, Selection::caret(8));
        assert_eq!(position, ScreenPosition { top: 48.0, left: 16.0 });
    }
}
