//! Lays a document out as terminal lines.
//!
//! Every textblock becomes one or more segments tagged with its ordinal, so
//! a caret position can be mapped back to a row and display column.

use note_editor_engine::model::TextPoint;
use note_editor_engine::{BlockId, BlockKind, BlockNode, Document, MarkSet};
use ratatui::text::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading(u8),
    Code,
    Header,
    Muted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub marks: MarkSet,
    pub tone: Tone,
    /// Textblock ordinal and the character offset this segment starts at
    pub source: Option<(usize, usize)>,
}

impl Segment {
    fn decoration(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::default(),
            tone: Tone::Muted,
            source: None,
        }
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayLine {
    pub segments: Vec<Segment>,
    /// Ids of every tracked block this line belongs to, innermost first
    pub blocks: Vec<BlockId>,
}

impl DisplayLine {
    fn prefixed(mut self, prefix: &str) -> Self {
        self.segments.insert(0, Segment::decoration(prefix));
        self
    }
}

/// Terminal columns taken by `text`.
pub fn display_width(text: &str) -> usize {
    Span::raw(text).width()
}

pub fn layout(doc: &Document) -> Vec<DisplayLine> {
    let mut ordinal = 0;
    doc.blocks
        .iter()
        .flat_map(|block| block_lines(block, &mut ordinal))
        .collect()
}

fn block_lines(block: &BlockNode, ordinal: &mut usize) -> Vec<DisplayLine> {
    let mut lines = match &block.kind {
        BlockKind::Paragraph => vec![textblock_line(block, Tone::Plain, ordinal)],
        BlockKind::Heading(level) => {
            let line = textblock_line(block, Tone::Heading(level.get()), ordinal);
            vec![line.prefixed(&format!("{} ", "#".repeat(level.get() as usize)))]
        }
        BlockKind::CodeBlock => code_lines(block, ordinal),
        BlockKind::HorizontalRule => vec![DisplayLine {
            segments: vec![Segment::decoration("─".repeat(24))],
            blocks: Vec::new(),
        }],
        BlockKind::BulletList | BlockKind::OrderedList => {
            let ordered = matches!(block.kind, BlockKind::OrderedList);
            let mut out = Vec::new();
            for (index, item) in block.children().into_iter().flatten().enumerate() {
                let marker = if ordered {
                    format!("{}. ", index + 1)
                } else {
                    "• ".to_string()
                };
                let indent = " ".repeat(display_width(&marker));
                let item_lines = children_lines(item, ordinal);
                for (row, line) in item_lines.into_iter().enumerate() {
                    out.push(line.prefixed(if row == 0 { &marker } else { &indent }));
                }
            }
            out
        }
        BlockKind::Blockquote => children_lines(block, ordinal)
            .into_iter()
            .map(|line| line.prefixed("│ "))
            .collect(),
        BlockKind::Table { .. } => table_lines(block, ordinal),
        BlockKind::ListItem | BlockKind::TableRow | BlockKind::TableCell(_) | BlockKind::TableHeader(_) => {
            children_lines(block, ordinal)
        }
    };
    if let Some(id) = &block.id {
        for line in &mut lines {
            line.blocks.push(id.clone());
        }
    }
    lines
}

fn children_lines(block: &BlockNode, ordinal: &mut usize) -> Vec<DisplayLine> {
    block
        .children()
        .into_iter()
        .flatten()
        .flat_map(|child| block_lines(child, ordinal))
        .collect()
}

fn textblock_line(block: &BlockNode, tone: Tone, ordinal: &mut usize) -> DisplayLine {
    let current = *ordinal;
    *ordinal += 1;
    let mut offset = 0;
    let mut segments = Vec::new();
    for run in block.runs().into_iter().flatten() {
        segments.push(Segment {
            text: run.text.clone(),
            marks: run.marks.clone(),
            tone,
            source: Some((current, offset)),
        });
        offset += run.len();
    }
    if segments.is_empty() {
        segments.push(Segment {
            text: String::new(),
            marks: MarkSet::default(),
            tone,
            source: Some((current, 0)),
        });
    }
    DisplayLine {
        segments,
        blocks: Vec::new(),
    }
}

/// Code keeps its newlines, so it spans several rows.
fn code_lines(block: &BlockNode, ordinal: &mut usize) -> Vec<DisplayLine> {
    let current = *ordinal;
    *ordinal += 1;
    let text = block.text_content();
    let mut offset = 0;
    let mut out = Vec::new();
    for line in text.split('\n') {
        out.push(
            DisplayLine {
                segments: vec![Segment {
                    text: line.to_string(),
                    marks: MarkSet::default(),
                    tone: Tone::Code,
                    source: Some((current, offset)),
                }],
                blocks: Vec::new(),
            }
            .prefixed("  "),
        );
        offset += line.chars().count() + 1;
    }
    out
}

/// One row per table row; the textblocks of a cell sit side by side.
fn table_lines(table: &BlockNode, ordinal: &mut usize) -> Vec<DisplayLine> {
    let mut out = Vec::new();
    for row in table.children().into_iter().flatten() {
        let mut line = DisplayLine::default();
        line.segments.push(Segment::decoration("│ "));
        for cell in row.children().into_iter().flatten() {
            let header = matches!(cell.kind, BlockKind::TableHeader(_));
            for (index, cell_line) in children_lines(cell, ordinal).into_iter().enumerate() {
                if index > 0 {
                    line.segments.push(Segment::decoration(" "));
                }
                line.segments.extend(cell_line.segments.into_iter().map(|mut segment| {
                    if header && segment.source.is_some() {
                        segment.tone = Tone::Header;
                    }
                    segment
                }));
            }
            line.segments.push(Segment::decoration(" │ "));
        }
        out.push(line);
    }
    out
}

/// Row and display column of a caret at `point`.
pub fn caret_cell(lines: &[DisplayLine], point: TextPoint) -> Option<(usize, usize)> {
    let mut fallback = None;
    for (row, line) in lines.iter().enumerate() {
        let mut column = 0;
        for segment in &line.segments {
            if let Some((ordinal, start)) = segment.source
                && ordinal == point.ordinal
                && point.offset >= start
                && point.offset <= start + segment.len()
            {
                let before: String = segment.text.chars().take(point.offset - start).collect();
                let cell = (row, column + display_width(&before));
                // A caret between two runs belongs to the later one.
                if point.offset < start + segment.len() {
                    return Some(cell);
                }
                fallback = Some(cell);
            }
            column += display_width(&segment.text);
        }
    }
    fallback
}

/// First row showing any part of the textblock `ordinal`.
pub fn row_of(lines: &[DisplayLine], ordinal: usize) -> Option<usize> {
    lines.iter().position(|line| {
        line.segments
            .iter()
            .any(|segment| segment.source.is_some_and(|(o, _)| o == ordinal))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use note_editor_engine::model::markup::parse_markup;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[DisplayLine]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.segments.iter().map(|segment| segment.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn test_layout_prefixes_blocks() {
        let doc = parse_markup(
            "<h2>Title</h2><ul><li><p>one</p><p>more</p></li></ul><ol><li><p>a</p></li><li><p>b</p></li></ol><blockquote><p>q</p></blockquote><hr>",
        )
        .unwrap();

        assert_eq!(
            plain(&layout(&doc)),
            vec![
                "## Title",
                "• one",
                "  more",
                "1. a",
                "2. b",
                "│ q",
                &"─".repeat(24),
            ]
        );
    }

    #[test]
    fn test_layout_puts_table_rows_on_one_line() {
        let doc = parse_markup(
            "<table><tr><th><p>h1</p></th><th><p>h2</p></th></tr><tr><td><p>a</p></td><td><p></p></td></tr></table>",
        )
        .unwrap();
        let lines = layout(&doc);

        assert_eq!(plain(&lines), vec!["│ h1 │ h2 │ ", "│ a │  │ "]);
        assert_eq!(lines[0].segments[1].tone, Tone::Header);
        assert_eq!(caret_cell(&lines, TextPoint { ordinal: 3, offset: 0 }), Some((1, 6)));
    }

    #[test]
    fn test_caret_cell_counts_wide_characters() {
        let doc = parse_markup("<p>제목 <strong>b</strong></p>").unwrap();
        let lines = layout(&doc);

        assert_eq!(caret_cell(&lines, TextPoint { ordinal: 0, offset: 2 }), Some((0, 4)));
        // End of the first run is the start of the bold one.
        assert_eq!(caret_cell(&lines, TextPoint { ordinal: 0, offset: 3 }), Some((0, 5)));
        assert_eq!(caret_cell(&lines, TextPoint { ordinal: 0, offset: 4 }), Some((0, 6)));
    }

    #[test]
    fn test_code_block_spans_rows() {
        let doc = parse_markup("<p>x</p><pre><code>fn a()\n{}</code></pre>").unwrap();
        let lines = layout(&doc);

        assert_eq!(plain(&lines), vec!["x", "  fn a()", "  {}"]);
        assert_eq!(caret_cell(&lines, TextPoint { ordinal: 1, offset: 8 }), Some((2, 3)));
        assert_eq!(row_of(&lines, 1), Some(1));
    }

    #[test]
    fn test_lines_know_their_blocks() {
        let doc = parse_markup(r#"<ul data-id="l"><li><p data-id="p">one</p></li></ul>"#).unwrap();
        let lines = layout(&doc);

        assert_eq!(lines[0].blocks, vec![BlockId::new("p"), BlockId::new("l")]);
    }
}
