/*!
# Document model

The document is an ordered tree of typed blocks. Textblocks (paragraph,
heading, code block) hold [`TextRun`]s; containers hold further blocks; the
horizontal rule is a leaf.

## Positions

Every location is a flat integer. Each non-leaf block contributes an opening
and a closing token, each character one, and a leaf one. The document itself
has no tokens, so positions range over `0..=content_size()`.

## Identity

Tracked kinds (see [`BlockKind::is_tracked`]) carry an optional [`BlockId`].
The model never invents ids; the identity assigner backfills them after each
change.
*/

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod inline;
pub mod markup;
pub mod position;

pub use inline::{Mark, MarkSet, MarkType, TextRun};
pub use position::{Path, Resolved, TextPoint, TextblockRef};

/// Stable identifier carried by tracked blocks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl HeadingLevel {
    pub fn get(self) -> u8 {
        self as u8
    }

    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::H1),
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            _ => None,
        }
    }
}

/// Attributes shared by table cells and header cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellAttrs {
    pub colspan: u32,
    pub rowspan: u32,
    pub style: Option<String>,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            style: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    Paragraph,
    Heading(HeadingLevel),
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Table { style: Option<String> },
    TableRow,
    TableCell(CellAttrs),
    TableHeader(CellAttrs),
}

impl BlockKind {
    /// Schema name of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading(_) => "heading",
            BlockKind::BulletList => "bulletList",
            BlockKind::OrderedList => "orderedList",
            BlockKind::ListItem => "listItem",
            BlockKind::Blockquote => "blockquote",
            BlockKind::CodeBlock => "codeBlock",
            BlockKind::HorizontalRule => "horizontalRule",
            BlockKind::Table { .. } => "table",
            BlockKind::TableRow => "tableRow",
            BlockKind::TableCell(_) => "tableCell",
            BlockKind::TableHeader(_) => "tableHeader",
        }
    }

    /// Kinds that receive a stable [`BlockId`].
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph
                | BlockKind::Heading(_)
                | BlockKind::BulletList
                | BlockKind::OrderedList
                | BlockKind::Blockquote
                | BlockKind::CodeBlock
        )
    }

    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::CodeBlock
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BlockKind::HorizontalRule)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, BlockKind::BulletList | BlockKind::OrderedList)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, BlockKind::TableCell(_) | BlockKind::TableHeader(_))
    }

    /// Containers whose children are ordinary flow blocks.
    pub fn accepts_flow(&self) -> bool {
        matches!(self, BlockKind::Blockquote | BlockKind::ListItem) || self.is_cell()
    }

    pub fn allows_marks(&self) -> bool {
        self.is_textblock() && *self != BlockKind::CodeBlock
    }

    pub fn is_flow_block(&self) -> bool {
        self.is_textblock()
            || self.is_list()
            || self.is_leaf()
            || matches!(self, BlockKind::Blockquote | BlockKind::Table { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    Inline(Vec<TextRun>),
    Blocks(Vec<BlockNode>),
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub kind: BlockKind,
    pub id: Option<BlockId>,
    pub content: Content,
}

impl BlockNode {
    pub fn textblock(kind: BlockKind, runs: Vec<TextRun>) -> Self {
        debug_assert!(kind.is_textblock());
        let mut runs = runs;
        inline::normalize(&mut runs);
        if kind == BlockKind::CodeBlock {
            inline::strip_marks(&mut runs);
        }
        Self {
            kind,
            id: None,
            content: Content::Inline(runs),
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::textblock(BlockKind::Paragraph, vec![TextRun::plain(text)])
    }

    pub fn empty_paragraph() -> Self {
        Self::textblock(BlockKind::Paragraph, Vec::new())
    }

    pub fn container(kind: BlockKind, children: Vec<BlockNode>) -> Self {
        debug_assert!(!kind.is_textblock() && !kind.is_leaf());
        Self {
            kind,
            id: None,
            content: Content::Blocks(children),
        }
    }

    pub fn horizontal_rule() -> Self {
        Self {
            kind: BlockKind::HorizontalRule,
            id: None,
            content: Content::Leaf,
        }
    }

    /// A cell of `kind` holding one empty paragraph.
    pub fn empty_cell(kind: BlockKind) -> Self {
        Self::container(kind, vec![Self::empty_paragraph()])
    }

    /// A `rows` x `cols` table whose first row is made of header cells when
    /// `with_header_row` is set.
    pub fn table(rows: usize, cols: usize, with_header_row: bool) -> Self {
        let rows = (0..rows)
            .map(|row| {
                let kind = if row == 0 && with_header_row {
                    BlockKind::TableHeader(CellAttrs::default())
                } else {
                    BlockKind::TableCell(CellAttrs::default())
                };
                let cells = (0..cols).map(|_| Self::empty_cell(kind.clone())).collect();
                Self::container(BlockKind::TableRow, cells)
            })
            .collect();
        Self::container(BlockKind::Table { style: None }, rows)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(BlockId::new(id));
        self
    }

    pub fn runs(&self) -> Option<&Vec<TextRun>> {
        match &self.content {
            Content::Inline(runs) => Some(runs),
            _ => None,
        }
    }

    pub fn runs_mut(&mut self) -> Option<&mut Vec<TextRun>> {
        match &mut self.content {
            Content::Inline(runs) => Some(runs),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<BlockNode>> {
        match &self.content {
            Content::Blocks(children) => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<BlockNode>> {
        match &mut self.content {
            Content::Blocks(children) => Some(children),
            _ => None,
        }
    }

    pub fn into_children(self) -> Vec<BlockNode> {
        match self.content {
            Content::Blocks(children) => children,
            _ => Vec::new(),
        }
    }

    pub fn content_size(&self) -> usize {
        match &self.content {
            Content::Inline(runs) => inline::inline_len(runs),
            Content::Blocks(children) => children.iter().map(BlockNode::node_size).sum(),
            Content::Leaf => 0,
        }
    }

    pub fn node_size(&self) -> usize {
        match self.content {
            Content::Leaf => 1,
            _ => self.content_size() + 2,
        }
    }

    /// Concatenated text of all descendant textblocks.
    pub fn text_content(&self) -> String {
        match &self.content {
            Content::Inline(runs) => inline::inline_text(runs),
            Content::Blocks(children) => children.iter().map(BlockNode::text_content).collect(),
            Content::Leaf => String::new(),
        }
    }

    pub fn is_empty_textblock(&self) -> bool {
        matches!(&self.content, Content::Inline(runs) if runs.is_empty())
    }

    /// Change a textblock's kind in place. Ids survive; code blocks drop marks.
    pub fn convert_textblock(&mut self, kind: BlockKind) {
        if kind == BlockKind::CodeBlock
            && let Content::Inline(runs) = &mut self.content
        {
            inline::strip_marks(runs);
        }
        self.kind = kind;
    }

    /// Remove ids from this block and all descendants.
    pub fn strip_ids(&mut self) {
        self.id = None;
        if let Content::Blocks(children) = &mut self.content {
            children.iter_mut().for_each(BlockNode::strip_ids);
        }
    }
}

/// Uniform read access to anything that occupies positions in the tree.
pub trait Node {
    fn type_name(&self) -> &'static str;
    fn node_size(&self) -> usize;
    fn text_content(&self) -> String;

    fn block_id(&self) -> Option<&BlockId> {
        None
    }
}

impl Node for BlockNode {
    fn type_name(&self) -> &'static str {
        self.kind.name()
    }

    fn node_size(&self) -> usize {
        BlockNode::node_size(self)
    }

    fn text_content(&self) -> String {
        BlockNode::text_content(self)
    }

    fn block_id(&self) -> Option<&BlockId> {
        self.id.as_ref()
    }
}

impl Node for TextRun {
    fn type_name(&self) -> &'static str {
        "text"
    }

    fn node_size(&self) -> usize {
        self.len()
    }

    fn text_content(&self) -> String {
        self.text.clone()
    }
}

/// A borrowed block or text run, as yielded by [`Document::descendants`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Block(&'a BlockNode),
    Text(&'a TextRun),
}

impl Node for NodeRef<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            NodeRef::Block(block) => block.type_name(),
            NodeRef::Text(run) => run.type_name(),
        }
    }

    fn node_size(&self) -> usize {
        match self {
            NodeRef::Block(block) => Node::node_size(*block),
            NodeRef::Text(run) => Node::node_size(*run),
        }
    }

    fn text_content(&self) -> String {
        match self {
            NodeRef::Block(block) => Node::text_content(*block),
            NodeRef::Text(run) => Node::text_content(*run),
        }
    }

    fn block_id(&self) -> Option<&BlockId> {
        match self {
            NodeRef::Block(block) => block.id.as_ref(),
            NodeRef::Text(_) => None,
        }
    }
}

/// The document root. Never empty: an empty body is one empty paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<BlockNode>,
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}

impl Document {
    pub fn new(blocks: Vec<BlockNode>) -> Self {
        let mut doc = Self { blocks };
        doc.ensure_not_empty();
        doc
    }

    pub fn empty() -> Self {
        Self {
            blocks: vec![BlockNode::empty_paragraph()],
        }
    }

    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(BlockNode::node_size).sum()
    }

    pub fn text_content(&self) -> String {
        self.blocks.iter().map(BlockNode::text_content).collect()
    }

    pub(crate) fn ensure_not_empty(&mut self) {
        if self.blocks.is_empty() {
            self.blocks.push(BlockNode::empty_paragraph());
        }
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&BlockNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get(*first)?;
        for index in rest {
            node = node.children()?.get(*index)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut BlockNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get_mut(*first)?;
        for index in rest {
            node = node.children_mut()?.get_mut(*index)?;
        }
        Some(node)
    }

    /// Children of the block at `parent`, or the top-level blocks for the
    /// empty path.
    pub fn children_at_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<BlockNode>> {
        if parent.is_empty() {
            Some(&mut self.blocks)
        } else {
            self.node_at_mut(parent)?.children_mut()
        }
    }

    /// Kind of the block at `parent`, `None` for the document root.
    pub fn kind_at(&self, parent: &[usize]) -> Option<&BlockKind> {
        if parent.is_empty() {
            None
        } else {
            self.node_at(parent).map(|node| &node.kind)
        }
    }

    /// Whether flow blocks may be placed directly under `parent`.
    pub fn accepts_flow(&self, parent: &[usize]) -> bool {
        match self.kind_at(parent) {
            None => parent.is_empty(),
            Some(kind) => kind.accepts_flow(),
        }
    }

    /// Nearest ancestor of `path` (excluding the node itself) matching `pred`.
    pub fn ancestor_where(&self, path: &[usize], pred: impl Fn(&BlockKind) -> bool) -> Option<Path> {
        (1..path.len())
            .rev()
            .map(|depth| &path[..depth])
            .find(|prefix| self.node_at(prefix).is_some_and(|node| pred(&node.kind)))
            .map(<[usize]>::to_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sizes() {
        let doc = Document::new(vec![
            BlockNode::paragraph("Hello"),
            BlockNode::horizontal_rule(),
            BlockNode::container(
                BlockKind::BulletList,
                vec![BlockNode::container(
                    BlockKind::ListItem,
                    vec![BlockNode::paragraph("a")],
                )],
            ),
        ]);
        // 7 + 1 + (2 + 2 + 3)
        assert_eq!(doc.content_size(), 15);
    }

    #[test]
    fn test_empty_document_gets_a_paragraph() {
        let doc = Document::new(Vec::new());
        assert_eq!(doc.blocks, vec![BlockNode::empty_paragraph()]);
        assert_eq!(doc.content_size(), 2);
    }

    #[test]
    fn test_table_shape() {
        let table = BlockNode::table(3, 2, true);
        let rows = table.children().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.children().unwrap().len() == 2));
        assert!(matches!(
            rows[0].children().unwrap()[0].kind,
            BlockKind::TableHeader(_)
        ));
        assert!(matches!(
            rows[1].children().unwrap()[0].kind,
            BlockKind::TableCell(_)
        ));
    }

    #[test]
    fn test_tracked_kinds() {
        assert!(BlockKind::Paragraph.is_tracked());
        assert!(BlockKind::Heading(HeadingLevel::H2).is_tracked());
        assert!(BlockKind::OrderedList.is_tracked());
        assert!(!BlockKind::ListItem.is_tracked());
        assert!(!BlockKind::HorizontalRule.is_tracked());
        assert!(!BlockKind::Table { style: None }.is_tracked());
    }

    #[test]
    fn test_convert_to_code_block_strips_marks() {
        let mut block = BlockNode::textblock(
            BlockKind::Paragraph,
            vec![
                TextRun::new("a", MarkSet::from_marks([Mark::Bold])),
                TextRun::plain("b"),
            ],
        )
        .with_id("id-keep");
        block.convert_textblock(BlockKind::CodeBlock);
        assert_eq!(block.runs().unwrap(), &vec![TextRun::plain("ab")]);
        assert_eq!(block.id, Some(BlockId::new("id-keep")));
    }

    #[test]
    fn test_ancestor_where() {
        let doc = Document::new(vec![BlockNode::container(
            BlockKind::Blockquote,
            vec![BlockNode::container(
                BlockKind::BulletList,
                vec![BlockNode::container(
                    BlockKind::ListItem,
                    vec![BlockNode::paragraph("x")],
                )],
            )],
        )]);
        assert_eq!(
            doc.ancestor_where(&[0, 0, 0, 0], BlockKind::is_list),
            Some(vec![0, 0])
        );
        assert_eq!(
            doc.ancestor_where(&[0, 0, 0, 0], |k| *k == BlockKind::Blockquote),
            Some(vec![0])
        );
        assert_eq!(doc.ancestor_where(&[0], BlockKind::is_list), None);
    }
}
