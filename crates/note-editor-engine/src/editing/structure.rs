//! Block type changes, wrapping and lifting.
//!
//! None of these commands create or destroy textblocks, so the selection is
//! carried across them as [`TextPoint`](crate::model::TextPoint)s.

use crate::model::{BlockKind, BlockNode, Content, Document, Path, TextPoint, TextblockRef};

use super::{EditorState, Selection, Transaction};

/// Textblocks touched by the selection, in document order.
pub(crate) fn selected_textblocks(doc: &Document, selection: Selection) -> Vec<TextblockRef> {
    doc.textblocks()
        .into_iter()
        .filter(|block| block.content_start() <= selection.to() && selection.from() <= block.content_end())
        .collect()
}

/// Deepest ancestor of `first` that also contains `last` and matches `pred`.
fn common_ancestor(
    doc: &Document,
    first: &TextblockRef,
    last: &TextblockRef,
    pred: impl Fn(&BlockKind) -> bool,
) -> Option<Path> {
    let mut path = first.path.clone();
    while path.len() > 1 {
        path.pop();
        if last.path.starts_with(&path) && doc.node_at(&path).is_some_and(|node| pred(&node.kind)) {
            return Some(path);
        }
    }
    None
}

/// The sibling range covering both textblocks, under a parent that accepts
/// flow content: `(parent, first index, last index)`.
fn block_range(doc: &Document, first: &TextblockRef, last: &TextblockRef) -> Option<(Path, usize, usize)> {
    let shared = first
        .path
        .iter()
        .zip(&last.path)
        .take_while(|(a, b)| a == b)
        .count();
    let depth = shared.min(first.path.len() - 1).min(last.path.len() - 1);
    let mut parent = first.path[..depth].to_vec();
    let mut start = first.path[depth];
    let mut end = last.path[depth];
    while !doc.accepts_flow(&parent) {
        let index = parent.pop()?;
        start = index;
        end = index;
    }
    Some((parent, start, end))
}

fn wrap(doc: &mut Document, parent: &[usize], start: usize, end: usize, wrapper: BlockKind) -> Option<()> {
    let siblings = doc.children_at_mut(parent)?;
    let taken: Vec<BlockNode> = siblings.drain(start..=end).collect();
    let children = if wrapper.is_list() {
        taken
            .into_iter()
            .map(|block| BlockNode::container(BlockKind::ListItem, vec![block]))
            .collect()
    } else {
        taken
    };
    siblings.insert(start, BlockNode::container(wrapper, children));
    Some(())
}

/// Move children `a..=b` of the container at `container` up one level,
/// splitting the container around them.
///
/// With `flatten`, the lifted children are list items whose content replaces
/// them; when the list is nested inside another list item the items move to
/// the outer list instead. The part before the lifted range keeps the
/// container's id.
fn lift(doc: &mut Document, container: &[usize], a: usize, b: usize, flatten: bool) -> Option<()> {
    let (index, parent) = container.split_last()?;
    let (index, parent) = (*index, parent.to_vec());
    let node = doc.node_at(container)?.clone();
    let children = node.children()?;
    let before = children[..a].to_vec();
    let middle = children[a..=b].to_vec();
    let after = children[b + 1..].to_vec();
    let piece = |children: Vec<BlockNode>, keep_id: bool| BlockNode {
        kind: node.kind.clone(),
        id: if keep_id { node.id.clone() } else { None },
        content: Content::Blocks(children),
    };

    if flatten && doc.kind_at(&parent) == Some(&BlockKind::ListItem) {
        let (item_index, outer) = parent.split_last()?;
        let (item_index, outer) = (*item_index, outer.to_vec());
        let mut items = middle;
        if !after.is_empty()
            && let Some(last) = items.last_mut()
            && let Some(content) = last.children_mut()
        {
            content.push(piece(after, false));
        }

        let item = doc.node_at_mut(&parent)?.children_mut()?;
        if before.is_empty() {
            item.remove(index);
        } else {
            item[index] = piece(before, true);
        }
        let item_is_empty = item.is_empty();

        let outer_items = doc.children_at_mut(&outer)?;
        if item_is_empty {
            outer_items.splice(item_index..=item_index, items);
        } else {
            outer_items.splice(item_index + 1..item_index + 1, items);
        }
        return Some(());
    }

    let lifted: Vec<BlockNode> = if flatten {
        middle.into_iter().flat_map(BlockNode::into_children).collect()
    } else {
        middle
    };
    let keep_before = !before.is_empty();
    let mut replacement = Vec::new();
    if keep_before {
        replacement.push(piece(before, true));
    }
    replacement.extend(lifted);
    if !after.is_empty() {
        replacement.push(piece(after, !keep_before));
    }
    doc.children_at_mut(&parent)?.splice(index..=index, replacement);
    Some(())
}

fn finish(state: &EditorState, doc: Document, points: Option<(TextPoint, TextPoint)>) -> Transaction {
    let selection = points
        .and_then(|points| Selection::from_points(&doc, points))
        .unwrap_or(state.selection);
    Transaction::doc_change(doc, selection)
}

/// Convert every selected textblock to `kind`. Not applied when nothing
/// would change.
pub(crate) fn set_block_type(state: &EditorState, kind: &BlockKind) -> Option<Transaction> {
    let targets = selected_textblocks(&state.doc, state.selection);
    let mut doc = state.doc.clone();
    let mut changed = false;
    for block in &targets {
        if let Some(node) = doc.node_at_mut(&block.path)
            && node.kind != *kind
        {
            node.convert_textblock(kind.clone());
            changed = true;
        }
    }
    changed.then(|| Transaction::doc_change(doc, state.selection))
}

/// `kind` unless every selected textblock already is one, then paragraph.
pub(crate) fn toggle_block_type(state: &EditorState, kind: &BlockKind) -> Option<Transaction> {
    let targets = selected_textblocks(&state.doc, state.selection);
    let all_match = !targets.is_empty()
        && targets
            .iter()
            .all(|block| state.doc.node_at(&block.path).is_some_and(|node| node.kind == *kind));
    if all_match {
        set_block_type(state, &BlockKind::Paragraph)
    } else {
        set_block_type(state, kind)
    }
}

pub(crate) fn toggle_list(state: &EditorState, kind: BlockKind) -> Option<Transaction> {
    let points = state.selection.points(&state.doc);
    let targets = selected_textblocks(&state.doc, state.selection);
    let (first, last) = (targets.first()?, targets.last()?);
    let mut doc = state.doc.clone();

    if let Some(list) = common_ancestor(&state.doc, first, last, BlockKind::is_list) {
        let depth = list.len();
        if doc.node_at(&list)?.kind == kind {
            lift(&mut doc, &list, first.path[depth], last.path[depth], true)?;
        } else {
            doc.node_at_mut(&list)?.kind = kind;
        }
    } else {
        let (parent, start, end) = block_range(&state.doc, first, last)?;
        wrap(&mut doc, &parent, start, end, kind)?;
    }
    Some(finish(state, doc, points))
}

pub(crate) fn toggle_blockquote(state: &EditorState) -> Option<Transaction> {
    let points = state.selection.points(&state.doc);
    let targets = selected_textblocks(&state.doc, state.selection);
    let (first, last) = (targets.first()?, targets.last()?);
    let mut doc = state.doc.clone();

    if let Some(quote) = common_ancestor(&state.doc, first, last, |kind| *kind == BlockKind::Blockquote) {
        let depth = quote.len();
        lift(&mut doc, &quote, first.path[depth], last.path[depth], false)?;
    } else {
        let (parent, start, end) = block_range(&state.doc, first, last)?;
        wrap(&mut doc, &parent, start, end, BlockKind::Blockquote)?;
    }
    Some(finish(state, doc, points))
}

const MAX_LIFTS: usize = 64;

/// Lift the selection out of every list and blockquote, then turn its
/// textblocks into paragraphs.
pub(crate) fn clear_nodes(state: &EditorState) -> Option<Transaction> {
    let points = state.selection.points(&state.doc)?;
    let mut doc = state.doc.clone();
    let mut changed = false;

    for _ in 0..MAX_LIFTS {
        let selection = Selection::from_points(&doc, points)?;
        let targets = selected_textblocks(&doc, selection);
        let (first, last) = (targets.first()?, targets.last()?);
        let Some(container) = common_ancestor(&doc, first, last, |kind| {
            kind.is_list() || *kind == BlockKind::Blockquote
        }) else {
            break;
        };
        let depth = container.len();
        let flatten = doc.node_at(&container)?.kind.is_list();
        lift(&mut doc, &container, first.path[depth], last.path[depth], flatten)?;
        changed = true;
    }

    let selection = Selection::from_points(&doc, points)?;
    for block in selected_textblocks(&doc, selection) {
        if let Some(node) = doc.node_at_mut(&block.path)
            && node.kind != BlockKind::Paragraph
        {
            node.convert_textblock(BlockKind::Paragraph);
            changed = true;
        }
    }
    changed.then(|| Transaction::doc_change(doc, selection))
}
