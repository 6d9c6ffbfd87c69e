use std::time::{Duration, Instant};

use note_editor_engine::{BlockId, Document, EditorSurface, ScreenPosition, Selection};

use crate::render::{caret_cell, layout};

/// Terminal cells as the unit of measure. Scroll and highlight requests are
/// parked here until the next frame picks them up.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    pub scroll_request: Option<usize>,
    pub highlight: Option<(BlockId, Instant)>,
}

impl TerminalSurface {
    /// The block still highlighted at `now`.
    pub fn highlighted(&self, now: Instant) -> Option<&BlockId> {
        match &self.highlight {
            Some((id, until)) if now < *until => Some(id),
            _ => None,
        }
    }
}

impl EditorSurface for TerminalSurface {
    fn measure_caret(&self, doc: &Document, selection: Selection) -> ScreenPosition {
        let cell = doc
            .text_point(selection.to())
            .and_then(|point| caret_cell(&layout(doc), point));
        match cell {
            Some((row, column)) => ScreenPosition {
                top: (row + 1) as f32,
                left: column as f32,
            },
            None => ScreenPosition::default(),
        }
    }

    fn scroll_into_view(&mut self, pos: usize) {
        self.scroll_request = Some(pos);
    }

    fn highlight_block(&mut self, id: &BlockId, duration: Duration) {
        self.highlight = Some((id.clone(), Instant::now() + duration));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_editor_engine::model::markup::parse_markup;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_caret_measured_below_its_row() {
        let doc = parse_markup("<p>one</p><h1>two</h1>").unwrap();
        let surface = TerminalSurface::default();

        // "two" content starts at 6; the heading prefix is two columns wide.
        let anchor = surface.measure_caret(&doc, Selection::caret(7));

        assert_eq!(anchor, ScreenPosition { top: 2.0, left: 3.0 });
    }

    #[test]
    fn test_highlight_expires() {
        let mut surface = TerminalSurface::default();
        let id = BlockId::new("b");
        surface.highlight_block(&id, Duration::from_millis(500));
        let now = Instant::now();

        assert_eq!(surface.highlighted(now), Some(&id));
        assert_eq!(surface.highlighted(now + Duration::from_secs(1)), None);
    }
}
