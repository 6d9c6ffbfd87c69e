//! Position arithmetic over the block tree.

use crate::error::CommandError;

use super::{BlockId, BlockNode, Content, Document, NodeRef, inline};

/// Child indices from the document root down to a block.
pub type Path = Vec<usize>;

/// A textblock located in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextblockRef {
    pub path: Path,
    /// Position of the opening token
    pub start: usize,
    /// Length of the inline content in characters
    pub len: usize,
}

impl TextblockRef {
    pub fn content_start(&self) -> usize {
        self.start + 1
    }

    pub fn content_end(&self) -> usize {
        self.start + 1 + self.len
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.content_start() <= pos && pos <= self.content_end()
    }
}

/// What a position points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Inside a textblock, `offset` characters into its content
    Text { block: TextblockRef, offset: usize },
    /// Between the children of a container (or of the document)
    Boundary { parent: Path, index: usize },
}

/// A caret location that survives structural edits which neither create nor
/// destroy textblocks: the n-th textblock and a character offset inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPoint {
    pub ordinal: usize,
    pub offset: usize,
}

fn walk_blocks<'a>(
    children: &'a [BlockNode],
    content_start: usize,
    path: &mut Path,
    visit: &mut impl FnMut(&Path, &'a BlockNode, usize),
) {
    let mut cursor = content_start;
    for (index, child) in children.iter().enumerate() {
        path.push(index);
        visit(path, child, cursor);
        if let Content::Blocks(grand) = &child.content {
            walk_blocks(grand, cursor + 1, path, visit);
        }
        path.pop();
        cursor += child.node_size();
    }
}

fn resolve_in(children: &[BlockNode], content_start: usize, pos: usize, parent: &mut Path) -> Resolved {
    let mut cursor = content_start;
    for (index, child) in children.iter().enumerate() {
        if pos == cursor {
            return Resolved::Boundary {
                parent: parent.clone(),
                index,
            };
        }
        let size = child.node_size();
        if pos < cursor + size {
            parent.push(index);
            match &child.content {
                Content::Inline(runs) => {
                    return Resolved::Text {
                        block: TextblockRef {
                            path: parent.clone(),
                            start: cursor,
                            len: inline::inline_len(runs),
                        },
                        offset: pos - cursor - 1,
                    };
                }
                Content::Blocks(grand) => return resolve_in(grand, cursor + 1, pos, parent),
                Content::Leaf => {
                    parent.pop();
                }
            }
        }
        cursor += size;
    }
    Resolved::Boundary {
        parent: parent.clone(),
        index: children.len(),
    }
}

impl Document {
    /// Visit every block in document order with its path and start position.
    pub fn for_each_block<'a>(&'a self, mut visit: impl FnMut(&Path, &'a BlockNode, usize)) {
        walk_blocks(&self.blocks, 0, &mut Vec::new(), &mut visit);
    }

    /// Every block and text run in document order, paired with its start
    /// position.
    pub fn descendants(&self) -> Vec<(NodeRef<'_>, usize)> {
        let mut out = Vec::new();
        self.for_each_block(|_, block, pos| {
            out.push((NodeRef::Block(block), pos));
            if let Content::Inline(runs) = &block.content {
                let mut cursor = pos + 1;
                for run in runs {
                    out.push((NodeRef::Text(run), cursor));
                    cursor += run.len();
                }
            }
        });
        out
    }

    pub fn textblocks(&self) -> Vec<TextblockRef> {
        let mut out = Vec::new();
        self.for_each_block(|path, block, pos| {
            if let Content::Inline(runs) = &block.content {
                out.push(TextblockRef {
                    path: path.clone(),
                    start: pos,
                    len: inline::inline_len(runs),
                });
            }
        });
        out
    }

    pub fn resolve(&self, pos: usize) -> Result<Resolved, CommandError> {
        let size = self.content_size();
        if pos > size {
            return Err(CommandError::InvalidRange {
                from: pos,
                to: pos,
                size,
            });
        }
        Ok(resolve_in(&self.blocks, 0, pos, &mut Vec::new()))
    }

    /// The textblock whose content contains `pos`, if any.
    pub fn textblock_at(&self, pos: usize) -> Option<(TextblockRef, usize)> {
        match self.resolve(pos).ok()? {
            Resolved::Text { block, offset } => Some((block, offset)),
            Resolved::Boundary { .. } => None,
        }
    }

    /// Start position of the block at `path`.
    pub fn pos_of_path(&self, path: &[usize]) -> Option<usize> {
        let (last, parents) = path.split_last()?;
        let mut pos = 0;
        let mut children = &self.blocks;
        for index in parents {
            let parent = children.get(*index)?;
            pos += children[..*index].iter().map(BlockNode::node_size).sum::<usize>() + 1;
            children = parent.children()?;
        }
        children.get(*last)?;
        pos += children[..*last].iter().map(BlockNode::node_size).sum::<usize>();
        Some(pos)
    }

    /// First tracked block carrying `id`, with its path and start position.
    pub fn find_block(&self, id: &BlockId) -> Option<(Path, usize)> {
        let mut found = None;
        self.for_each_block(|path, block, pos| {
            if found.is_none() && block.id.as_ref() == Some(id) {
                found = Some((path.clone(), pos));
            }
        });
        found
    }

    /// Text of all textblock content between `from` and `to`, with
    /// `block_separator` inserted between pieces from different textblocks.
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut out = String::new();
        let mut first = true;
        for block in self.textblocks() {
            let lo = from.max(block.content_start());
            let hi = to.min(block.content_end());
            if lo >= hi {
                continue;
            }
            if !first {
                out.push_str(block_separator);
            }
            first = false;
            if let Some(runs) = self.node_at(&block.path).and_then(BlockNode::runs) {
                let slice = inline::slice_runs(runs, lo - block.content_start(), hi - block.content_start());
                out.push_str(&inline::inline_text(&slice));
            }
        }
        out
    }

    pub fn text_point(&self, pos: usize) -> Option<TextPoint> {
        self.textblocks()
            .iter()
            .enumerate()
            .find(|(_, block)| block.contains(pos))
            .map(|(ordinal, block)| TextPoint {
                ordinal,
                offset: pos - block.content_start(),
            })
    }

    pub fn pos_at_point(&self, point: TextPoint) -> Option<usize> {
        self.textblocks()
            .get(point.ordinal)
            .map(|block| block.content_start() + point.offset.min(block.len))
    }

    /// The closest caret position inside a textblock. Searches forward first
    /// when `forward` is set, backward otherwise.
    pub fn nearest_text_pos(&self, pos: usize, forward: bool) -> usize {
        let blocks = self.textblocks();
        if let Some(block) = blocks.iter().find(|block| block.contains(pos)) {
            return pos.clamp(block.content_start(), block.content_end());
        }
        let after = blocks.iter().find(|block| block.content_start() >= pos);
        let before = blocks.iter().rev().find(|block| block.content_end() <= pos);
        let pick = if forward {
            after.map(TextblockRef::content_start).or(before.map(TextblockRef::content_end))
        } else {
            before.map(TextblockRef::content_end).or(after.map(TextblockRef::content_start))
        };
        pick.unwrap_or_else(|| pos.min(self.content_size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, TextRun};
    use pretty_assertions::assert_eq;

    fn sample() -> Document {
        // <p>Hi</p><hr><ul><li><p>ab</p></li></ul>
        Document::new(vec![
            BlockNode::paragraph("Hi"),
            BlockNode::horizontal_rule(),
            BlockNode::container(
                BlockKind::BulletList,
                vec![BlockNode::container(
                    BlockKind::ListItem,
                    vec![BlockNode::paragraph("ab")],
                )],
            ),
        ])
    }

    #[test]
    fn test_resolve_text_and_boundaries() {
        let doc = sample();
        assert_eq!(
            doc.resolve(0).unwrap(),
            Resolved::Boundary {
                parent: vec![],
                index: 0
            }
        );
        assert_eq!(
            doc.resolve(3).unwrap(),
            Resolved::Text {
                block: TextblockRef {
                    path: vec![0],
                    start: 0,
                    len: 2
                },
                offset: 2
            }
        );
        assert_eq!(
            doc.resolve(4).unwrap(),
            Resolved::Boundary {
                parent: vec![],
                index: 1
            }
        );
        assert_eq!(
            doc.resolve(5).unwrap(),
            Resolved::Boundary {
                parent: vec![],
                index: 2
            }
        );
        // ul opens at 5, li at 6, p at 7, text starts at 8
        assert_eq!(
            doc.resolve(8).unwrap(),
            Resolved::Text {
                block: TextblockRef {
                    path: vec![2, 0, 0],
                    start: 7,
                    len: 2
                },
                offset: 0
            }
        );
        assert_eq!(doc.content_size(), 13);
        assert!(doc.resolve(14).is_err());
    }

    #[test]
    fn test_descendants_include_text_runs() {
        let doc = sample();
        let listed: Vec<(&str, usize)> = doc
            .descendants()
            .iter()
            .map(|(node, pos)| (crate::model::Node::type_name(node), *pos))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("paragraph", 0),
                ("text", 1),
                ("horizontalRule", 4),
                ("bulletList", 5),
                ("listItem", 6),
                ("paragraph", 7),
                ("text", 8),
            ]
        );
    }

    #[test]
    fn test_pos_of_path() {
        let doc = sample();
        assert_eq!(doc.pos_of_path(&[0]), Some(0));
        assert_eq!(doc.pos_of_path(&[1]), Some(4));
        assert_eq!(doc.pos_of_path(&[2, 0, 0]), Some(7));
        assert_eq!(doc.pos_of_path(&[3]), None);
        assert_eq!(doc.pos_of_path(&[2, 1]), None);
        assert_eq!(doc.pos_of_path(&[]), None);
    }

    #[test]
    fn test_text_between_spans_blocks() {
        let doc = sample();
        assert_eq!(doc.text_between(0, doc.content_size(), "\n"), "Hi\nab");
        assert_eq!(doc.text_between(2, 9, ""), "ia");
    }

    #[test]
    fn test_text_points_round_trip_through_positions() {
        let doc = sample();
        let point = doc.text_point(9).unwrap();
        assert_eq!(point, TextPoint { ordinal: 1, offset: 1 });
        assert_eq!(doc.pos_at_point(point), Some(9));
        assert_eq!(doc.text_point(4), None);
    }

    #[test]
    fn test_nearest_text_pos() {
        let doc = sample();
        assert_eq!(doc.nearest_text_pos(0, true), 1);
        assert_eq!(doc.nearest_text_pos(4, true), 8);
        assert_eq!(doc.nearest_text_pos(4, false), 3);
        assert_eq!(doc.nearest_text_pos(13, true), 10);
    }

    #[test]
    fn test_multibyte_characters_count_once() {
        let doc = Document::new(vec![BlockNode::textblock(
            BlockKind::Paragraph,
            vec![TextRun::plain("표 삽입")],
        )]);
        assert_eq!(doc.content_size(), 6);
        assert_eq!(doc.text_between(1, 2, ""), "표");
    }
}
