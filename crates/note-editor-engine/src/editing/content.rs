//! Inserting and deleting content.

use crate::error::CommandError;
use crate::model::markup::{Fragment, parse_fragment};
use crate::model::{BlockKind, BlockNode, Content, Document, MarkSet, Path, Resolved, TextRun, inline};

use super::{EditorState, Selection, Transaction};

/// Content accepted by [`Command::InsertContentAt`](super::Command::InsertContentAt).
#[derive(Debug, Clone, PartialEq)]
pub enum InsertContent {
    /// Plain text, inserted without marks
    Text(String),
    /// Serialized markup; inline-only markup is inserted inline
    Markup(String),
    Blocks(Vec<BlockNode>),
}

fn invalid_range(from: usize, to: usize, doc: &Document) -> CommandError {
    CommandError::InvalidRange {
        from,
        to,
        size: doc.content_size(),
    }
}

/// Whether `child` may sit directly under a block of kind `parent` (`None`
/// is the document root).
pub(crate) fn fits_under(parent: Option<&BlockKind>, child: &BlockKind) -> bool {
    match parent {
        None => child.is_flow_block(),
        Some(kind) if kind.accepts_flow() => child.is_flow_block(),
        Some(kind) if kind.is_list() => *child == BlockKind::ListItem,
        Some(BlockKind::Table { .. }) => *child == BlockKind::TableRow,
        Some(BlockKind::TableRow) => child.is_cell(),
        Some(_) => false,
    }
}

fn nearest_cell(doc: &Document, path: &[usize]) -> Option<Path> {
    doc.ancestor_where(path, BlockKind::is_cell)
}

/// Remove everything between `from` and `to`.
///
/// Blocks entirely inside the range go away, partially covered textblocks are
/// trimmed and, when both ends sit in textblocks of the same cell (or both
/// outside any table), the tail of the last one is joined onto the first.
/// Table cells are emptied rather than removed, containers left empty are
/// dropped and the document never ends up empty.
pub(crate) fn delete_range(doc: &mut Document, from: usize, to: usize) -> Result<(), CommandError> {
    let size = doc.content_size();
    if from > to || to > size {
        return Err(invalid_range(from, to, doc));
    }
    if from == to {
        return Ok(());
    }

    let start = doc.textblock_at(from);
    let end = doc.textblock_at(to);
    let join = match (&start, &end) {
        (Some((a, _)), Some((b, _))) => {
            a.path != b.path && nearest_cell(doc, &a.path) == nearest_cell(doc, &b.path)
        }
        _ => false,
    };
    let tail = match (&end, join) {
        (Some((block, offset)), true) => doc
            .node_at(&block.path)
            .and_then(BlockNode::runs)
            .map(|runs| inline::slice_runs(runs, *offset, block.len))
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    let join_start = end.as_ref().filter(|_| join).map(|(block, _)| block.start);

    prune(&mut doc.blocks, 0, from, to, join_start, false);

    if let Some((block, _)) = start.filter(|_| join)
        && let Some(node) = doc.node_at_mut(&block.path)
    {
        let allows_marks = node.kind.allows_marks();
        if let Some(runs) = node.runs_mut() {
            let mut tail = tail;
            if !allows_marks {
                inline::strip_marks(&mut tail);
            }
            let at = inline::inline_len(runs);
            inline::insert_runs(runs, at, tail);
        }
    }

    doc.ensure_not_empty();
    Ok(())
}

fn prune(
    children: &mut Vec<BlockNode>,
    content_start: usize,
    from: usize,
    to: usize,
    join_start: Option<usize>,
    in_row: bool,
) {
    let mut cursor = content_start;
    let mut kept = Vec::with_capacity(children.len());
    for mut child in children.drain(..) {
        let start = cursor;
        let end = start + child.node_size();
        cursor = end;

        if end <= from || start >= to {
            kept.push(child);
            continue;
        }
        if (from <= start && end <= to) || join_start == Some(start) {
            if in_row {
                kept.push(BlockNode::empty_cell(child.kind));
            }
            continue;
        }

        let is_row = child.kind == BlockKind::TableRow;
        let is_cell = child.kind.is_cell();
        match &mut child.content {
            Content::Inline(runs) => {
                let content_start = start + 1;
                let lo = from.max(content_start) - content_start;
                let hi = to.min(end - 1).saturating_sub(content_start);
                if lo < hi {
                    inline::delete_text(runs, lo, hi);
                }
            }
            Content::Blocks(grand) => {
                prune(grand, start + 1, from, to, join_start, is_row);
                if grand.is_empty() {
                    if !is_cell {
                        continue;
                    }
                    grand.push(BlockNode::empty_paragraph());
                }
            }
            Content::Leaf => {}
        }
        kept.push(child);
    }
    *children = kept;
}

/// Insert `blocks` at `pos`.
///
/// Inside a textblock the blocks go before it (at its start), after it (at
/// its end) or split it in two. With `replace_empty`, an empty textblock is
/// replaced instead. Returns the path of the first inserted block, or `None`
/// when the blocks cannot be placed there.
pub(crate) fn insert_blocks(
    doc: &mut Document,
    pos: usize,
    blocks: Vec<BlockNode>,
    replace_empty: bool,
) -> Result<Option<Path>, CommandError> {
    let (parent, index, split) = match doc.resolve(pos)? {
        Resolved::Text { block, offset } => {
            let Some((index, parent)) = block.path.split_last() else {
                return Ok(None);
            };
            let split = if replace_empty && block.len == 0 {
                Split::Replace
            } else if offset == 0 {
                Split::Before
            } else if offset == block.len {
                Split::After
            } else {
                Split::At(offset)
            };
            (parent.to_vec(), *index, split)
        }
        Resolved::Boundary { parent, index } => (parent, index, Split::Before),
    };

    let parent_kind = doc.kind_at(&parent).cloned();
    if !blocks.iter().all(|block| fits_under(parent_kind.as_ref(), &block.kind)) {
        return Ok(None);
    }
    let Some(siblings) = doc.children_at_mut(&parent) else {
        return Ok(None);
    };

    let first = match split {
        Split::Replace => {
            siblings.splice(index..=index, blocks);
            index
        }
        Split::Before => {
            siblings.splice(index..index, blocks);
            index
        }
        Split::After => {
            siblings.splice(index + 1..index + 1, blocks);
            index + 1
        }
        Split::At(offset) => {
            let count = blocks.len();
            let node = &mut siblings[index];
            let runs = node.runs_mut().map(std::mem::take).unwrap_or_default();
            let (left, right) = inline::split_runs(runs, offset);
            if let Some(runs) = node.runs_mut() {
                *runs = left;
            }
            let tail = BlockNode::textblock(node.kind.clone(), right);
            siblings.splice(index + 1..index + 1, blocks);
            siblings.insert(index + 1 + count, tail);
            index + 1
        }
    };

    let mut path = parent;
    path.push(first);
    Ok(Some(path))
}

enum Split {
    Replace,
    Before,
    After,
    At(usize),
}

pub(crate) fn delete_range_command(
    state: &EditorState,
    from: usize,
    to: usize,
) -> Result<Option<Transaction>, CommandError> {
    let size = state.doc.content_size();
    if from > to || to > size {
        return Err(invalid_range(from, to, &state.doc));
    }
    if from == to {
        return Ok(None);
    }
    let mut doc = state.doc.clone();
    delete_range(&mut doc, from, to)?;
    let removed = size.saturating_sub(doc.content_size());
    let selection = state.selection.map_delete(from, to, removed);
    Ok(Some(Transaction::doc_change(doc, selection)))
}

pub(crate) fn insert_text(state: &EditorState, text: &str) -> Result<Option<Transaction>, CommandError> {
    if text.is_empty() {
        return Ok(None);
    }
    let mut doc = state.doc.clone();
    let pos = state.selection.from();
    if !state.selection.is_empty() {
        delete_range(&mut doc, pos, state.selection.to())?;
    }
    let typed = text.chars().count();

    match doc.resolve(pos)? {
        Resolved::Text { block, offset } => {
            let Some(node) = doc.node_at_mut(&block.path) else {
                return Ok(None);
            };
            let allows_marks = node.kind.allows_marks();
            let Some(runs) = node.runs_mut() else {
                return Ok(None);
            };
            let marks = if allows_marks {
                state
                    .stored_marks
                    .clone()
                    .unwrap_or_else(|| inline::marks_at(runs, offset))
            } else {
                MarkSet::new()
            };
            inline::insert_text(runs, offset, text, marks);
            Ok(Some(Transaction::doc_change(doc, Selection::caret(pos + typed))))
        }
        Resolved::Boundary { .. } => {
            let marks = state.stored_marks.clone().unwrap_or_default();
            let paragraph = BlockNode::textblock(BlockKind::Paragraph, vec![TextRun::new(text, marks)]);
            let Some(path) = insert_blocks(&mut doc, pos, vec![paragraph], false)? else {
                return Ok(None);
            };
            let caret = doc.pos_of_path(&path).map_or(pos, |start| start + 1 + typed);
            Ok(Some(Transaction::doc_change(doc, Selection::caret(caret))))
        }
    }
}

/// Backspace: delete the selection, or the character before the caret.
pub(crate) fn delete_backward(state: &EditorState) -> Result<Option<Transaction>, CommandError> {
    let selection = state.selection;
    if !selection.is_empty() {
        return delete_range_command(state, selection.from(), selection.to());
    }
    let pos = selection.from();
    match state.doc.textblock_at(pos) {
        Some((_, offset)) if offset > 0 => delete_range_command(state, pos - 1, pos),
        _ => Ok(None),
    }
}

pub(crate) fn insert_content_at(
    state: &EditorState,
    pos: usize,
    content: &InsertContent,
) -> Result<Option<Transaction>, CommandError> {
    let size = state.doc.content_size();
    if pos > size {
        return Err(invalid_range(pos, pos, &state.doc));
    }
    let fragment = match content {
        InsertContent::Text(text) => Fragment::Inline(vec![TextRun::plain(text.as_str())]),
        InsertContent::Markup(source) => parse_fragment(source)?,
        InsertContent::Blocks(blocks) => Fragment::Blocks(blocks.clone()),
    };

    let mut doc = state.doc.clone();
    match fragment {
        Fragment::Inline(mut runs) => {
            inline::normalize(&mut runs);
            if runs.is_empty() {
                return Ok(None);
            }
            match doc.resolve(pos)? {
                Resolved::Text { block, offset } => {
                    let Some(node) = doc.node_at_mut(&block.path) else {
                        return Ok(None);
                    };
                    if !node.kind.allows_marks() {
                        inline::strip_marks(&mut runs);
                    }
                    if let Some(existing) = node.runs_mut() {
                        inline::insert_runs(existing, offset, runs);
                    }
                }
                Resolved::Boundary { .. } => {
                    let paragraph = BlockNode::textblock(BlockKind::Paragraph, runs);
                    if insert_blocks(&mut doc, pos, vec![paragraph], false)?.is_none() {
                        return Ok(None);
                    }
                }
            }
        }
        Fragment::Blocks(mut blocks) => {
            if blocks.is_empty() {
                return Ok(None);
            }
            blocks.iter_mut().for_each(BlockNode::strip_ids);
            if insert_blocks(&mut doc, pos, blocks, false)?.is_none() {
                return Ok(None);
            }
        }
    }

    let delta = doc.content_size() as isize - size as isize;
    let selection = state.selection.map_insert(pos, delta);
    Ok(Some(Transaction::doc_change(doc, selection)))
}

/// Replace the selection with a horizontal rule and put the caret after it.
pub(crate) fn set_horizontal_rule(state: &EditorState) -> Result<Option<Transaction>, CommandError> {
    let mut doc = state.doc.clone();
    let selection = state.selection;
    delete_range(&mut doc, selection.from(), selection.to())?;

    let Some(path) = insert_blocks(&mut doc, selection.from(), vec![BlockNode::horizontal_rule()], true)?
    else {
        return Ok(None);
    };
    if let Some((index, parent)) = path.split_last()
        && let Some(siblings) = doc.children_at_mut(parent)
        && siblings.len() == index + 1
    {
        siblings.push(BlockNode::empty_paragraph());
    }
    let after = doc.pos_of_path(&path).map_or(selection.from(), |start| start + 1);
    Ok(Some(Transaction::doc_change(doc, Selection::caret(after))))
}

/// Replace the selection with a fresh table and put the caret in its first
/// cell.
pub(crate) fn insert_table(
    state: &EditorState,
    rows: usize,
    cols: usize,
    with_header_row: bool,
) -> Result<Option<Transaction>, CommandError> {
    if rows == 0 || cols == 0 {
        return Err(CommandError::InvalidTableShape { rows, cols });
    }
    let mut doc = state.doc.clone();
    let selection = state.selection;
    delete_range(&mut doc, selection.from(), selection.to())?;

    let table = BlockNode::table(rows, cols, with_header_row);
    let Some(path) = insert_blocks(&mut doc, selection.from(), vec![table], true)? else {
        return Ok(None);
    };
    let inside = doc.pos_of_path(&path).map_or(selection.from(), |start| start + 1);
    Ok(Some(Transaction::doc_change(doc, Selection::caret(inside))))
}
