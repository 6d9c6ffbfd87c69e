//! Table editing around the cell holding the caret.
//!
//! Row and column operations treat the table as a plain grid of child
//! indices; `colspan`/`rowspan` values are kept but not interpreted.

use crate::error::CommandError;
use crate::model::{BlockKind, BlockNode, CellAttrs, Document, Path};

use super::{EditorState, Selection, Transaction};

struct CellContext {
    table: Path,
    row: usize,
    col: usize,
    /// Caret offset from the cell's content start
    offset: usize,
}

fn cell_context(doc: &Document, selection: Selection) -> Option<CellContext> {
    let (block, _) = doc.textblock_at(selection.from())?;
    let cell = doc.ancestor_where(&block.path, BlockKind::is_cell)?;
    let (col, row_path) = cell.split_last()?;
    let (row, table) = row_path.split_last()?;
    if !matches!(doc.kind_at(table), Some(BlockKind::Table { .. })) {
        return None;
    }
    let cell_start = doc.pos_of_path(&cell)?;
    Some(CellContext {
        table: table.to_vec(),
        row: *row,
        col: *col,
        offset: selection.from().saturating_sub(cell_start + 1),
    })
}

fn caret_in_cell(doc: &Document, table: &[usize], row: usize, col: usize, offset: usize) -> Selection {
    let mut cell = table.to_vec();
    cell.extend([row, col]);
    match doc.pos_of_path(&cell) {
        Some(start) => Selection::caret(start + 1 + offset),
        None => Selection::caret(doc.pos_of_path(table).unwrap_or(0)),
    }
}

/// Cells of every row of the table at `table`.
fn rows_mut<'a>(doc: &'a mut Document, table: &[usize]) -> Option<impl Iterator<Item = &'a mut Vec<BlockNode>>> {
    let rows = doc.node_at_mut(table)?.children_mut()?;
    Some(rows.iter_mut().filter_map(BlockNode::children_mut))
}

fn fresh_cell_like(kind: &BlockKind) -> BlockNode {
    match kind {
        BlockKind::TableHeader(_) => BlockNode::empty_cell(BlockKind::TableHeader(CellAttrs::default())),
        _ => BlockNode::empty_cell(BlockKind::TableCell(CellAttrs::default())),
    }
}

/// Remove the block at `path`, refilling an emptied parent.
fn remove_block(doc: &mut Document, path: &[usize]) -> Option<()> {
    let (index, parent) = path.split_last()?;
    let siblings = doc.children_at_mut(parent)?;
    siblings.remove(*index);
    if siblings.is_empty() && !parent.is_empty() {
        siblings.push(BlockNode::empty_paragraph());
    }
    doc.ensure_not_empty();
    Some(())
}

pub(crate) fn add_column(state: &EditorState, after: bool) -> Option<Transaction> {
    let ctx = cell_context(&state.doc, state.selection)?;
    let mut doc = state.doc.clone();
    for cells in rows_mut(&mut doc, &ctx.table)? {
        let reference = cells.get(ctx.col.min(cells.len().saturating_sub(1)))?;
        let cell = fresh_cell_like(&reference.kind);
        let at = if after { ctx.col + 1 } else { ctx.col };
        cells.insert(at.min(cells.len()), cell);
    }
    let col = if after { ctx.col } else { ctx.col + 1 };
    let selection = caret_in_cell(&doc, &ctx.table, ctx.row, col, ctx.offset);
    Some(Transaction::doc_change(doc, selection))
}

pub(crate) fn add_row(state: &EditorState, after: bool) -> Option<Transaction> {
    let ctx = cell_context(&state.doc, state.selection)?;
    let mut doc = state.doc.clone();
    let rows = doc.node_at_mut(&ctx.table)?.children_mut()?;
    let width = rows.get(ctx.row)?.children()?.len();
    let cells = (0..width)
        .map(|_| BlockNode::empty_cell(BlockKind::TableCell(CellAttrs::default())))
        .collect();
    let at = if after { ctx.row + 1 } else { ctx.row };
    rows.insert(at, BlockNode::container(BlockKind::TableRow, cells));
    let row = if after { ctx.row } else { ctx.row + 1 };
    let selection = caret_in_cell(&doc, &ctx.table, row, ctx.col, ctx.offset);
    Some(Transaction::doc_change(doc, selection))
}

pub(crate) fn delete_column(state: &EditorState) -> Option<Transaction> {
    let ctx = cell_context(&state.doc, state.selection)?;
    let mut doc = state.doc.clone();
    for cells in rows_mut(&mut doc, &ctx.table)? {
        if ctx.col < cells.len() {
            cells.remove(ctx.col);
        }
    }
    let rows = doc.node_at_mut(&ctx.table)?.children_mut()?;
    rows.retain(|row| row.children().is_some_and(|cells| !cells.is_empty()));
    if rows.is_empty() {
        return drop_table(state, doc, &ctx.table);
    }
    let col = ctx.col.saturating_sub(1);
    let selection = caret_in_cell(&doc, &ctx.table, ctx.row, col, 0);
    Some(Transaction::doc_change(doc, selection))
}

pub(crate) fn delete_row(state: &EditorState) -> Option<Transaction> {
    let ctx = cell_context(&state.doc, state.selection)?;
    let mut doc = state.doc.clone();
    let rows = doc.node_at_mut(&ctx.table)?.children_mut()?;
    rows.remove(ctx.row);
    if rows.is_empty() {
        return drop_table(state, doc, &ctx.table);
    }
    let row = ctx.row.min(rows.len() - 1);
    let width = rows[row].children().map_or(0, Vec::len);
    let col = ctx.col.min(width.saturating_sub(1));
    let selection = caret_in_cell(&doc, &ctx.table, row, col, 0);
    Some(Transaction::doc_change(doc, selection))
}

pub(crate) fn delete_table(state: &EditorState) -> Option<Transaction> {
    let ctx = cell_context(&state.doc, state.selection)?;
    drop_table(state, state.doc.clone(), &ctx.table)
}

fn drop_table(state: &EditorState, mut doc: Document, table: &[usize]) -> Option<Transaction> {
    let start = state.doc.pos_of_path(table)?;
    remove_block(&mut doc, table)?;
    Some(Transaction::doc_change(doc, Selection::caret(start)))
}

fn normalize_width(value: &str) -> Result<String, CommandError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CommandError::InvalidWidth(value.to_string()));
    }
    if value.contains('%') || value.contains("px") {
        Ok(value.to_string())
    } else {
        Ok(format!("{value}px"))
    }
}

/// Fix the table's width; bare numbers are taken as pixels.
pub(crate) fn set_table_width(state: &EditorState, width: &str) -> Result<Option<Transaction>, CommandError> {
    let width = normalize_width(width)?;
    let Some(ctx) = cell_context(&state.doc, state.selection) else {
        return Ok(None);
    };
    let mut doc = state.doc.clone();
    let Some(table) = doc.node_at_mut(&ctx.table) else {
        return Ok(None);
    };
    table.kind = BlockKind::Table {
        style: Some(format!("width: {width}; table-layout: fixed;")),
    };
    Ok(Some(Transaction::doc_change(doc, state.selection)))
}

/// Set the width of the cell holding the caret.
pub(crate) fn set_cell_width(state: &EditorState, width: &str) -> Result<Option<Transaction>, CommandError> {
    let width = normalize_width(width)?;
    let Some(ctx) = cell_context(&state.doc, state.selection) else {
        return Ok(None);
    };
    let mut doc = state.doc.clone();
    let mut cell = ctx.table.clone();
    cell.extend([ctx.row, ctx.col]);
    let Some(node) = doc.node_at_mut(&cell) else {
        return Ok(None);
    };
    if let BlockKind::TableCell(attrs) | BlockKind::TableHeader(attrs) = &mut node.kind {
        attrs.style = Some(format!("width: {width};"));
    }
    Ok(Some(Transaction::doc_change(doc, state.selection)))
}
