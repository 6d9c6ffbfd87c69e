use crate::error::CommandError;
use crate::model::{BlockKind, HeadingLevel, Mark};

use super::content::{self, InsertContent};
use super::{EditorState, Transaction, marks, structure, table};

/// Every edit the engine knows how to perform.
///
/// Commands are pure: [`Command::apply`] reads an [`EditorState`] and returns
/// the resulting [`Transaction`], `Ok(None)` when the command does not apply
/// (which is not an error), or a [`CommandError`] for invalid arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetParagraph,
    SetHeading(HeadingLevel),
    ToggleHeading(HeadingLevel),
    /// Lift out of lists and blockquotes, then reset to paragraphs
    ClearNodes,
    ToggleBulletList,
    ToggleOrderedList,
    ToggleCodeBlock,
    ToggleBlockquote,
    SetHorizontalRule,
    InsertTable {
        rows: usize,
        cols: usize,
        with_header_row: bool,
    },
    AddColumnBefore,
    AddColumnAfter,
    AddRowBefore,
    AddRowAfter,
    DeleteColumn,
    DeleteRow,
    DeleteTable,
    SetTableWidth(String),
    SetCellWidth(String),
    ToggleBold,
    ToggleItalic,
    ToggleStrike,
    SetFontFamily(String),
    UnsetFontFamily,
    DeleteRange {
        from: usize,
        to: usize,
    },
    InsertContentAt {
        pos: usize,
        content: InsertContent,
    },
    /// Type text at the selection
    InsertText(String),
    /// Backspace
    DeleteBackward,
    /// Run commands in order against the evolving state, as one transaction
    Chain(Vec<Command>),
}

impl Command {
    pub fn apply(&self, state: &EditorState) -> Result<Option<Transaction>, CommandError> {
        let tx = match self {
            Command::SetParagraph => structure::set_block_type(state, &BlockKind::Paragraph),
            Command::SetHeading(level) => structure::set_block_type(state, &BlockKind::Heading(*level)),
            Command::ToggleHeading(level) => {
                structure::toggle_block_type(state, &BlockKind::Heading(*level))
            }
            Command::ClearNodes => structure::clear_nodes(state),
            Command::ToggleBulletList => structure::toggle_list(state, BlockKind::BulletList),
            Command::ToggleOrderedList => structure::toggle_list(state, BlockKind::OrderedList),
            Command::ToggleCodeBlock => structure::toggle_block_type(state, &BlockKind::CodeBlock),
            Command::ToggleBlockquote => structure::toggle_blockquote(state),
            Command::SetHorizontalRule => return content::set_horizontal_rule(state),
            Command::InsertTable {
                rows,
                cols,
                with_header_row,
            } => return content::insert_table(state, *rows, *cols, *with_header_row),
            Command::AddColumnBefore => table::add_column(state, false),
            Command::AddColumnAfter => table::add_column(state, true),
            Command::AddRowBefore => table::add_row(state, false),
            Command::AddRowAfter => table::add_row(state, true),
            Command::DeleteColumn => table::delete_column(state),
            Command::DeleteRow => table::delete_row(state),
            Command::DeleteTable => table::delete_table(state),
            Command::SetTableWidth(width) => return table::set_table_width(state, width),
            Command::SetCellWidth(width) => return table::set_cell_width(state, width),
            Command::ToggleBold => marks::toggle_mark(state, Mark::Bold),
            Command::ToggleItalic => marks::toggle_mark(state, Mark::Italic),
            Command::ToggleStrike => marks::toggle_mark(state, Mark::Strike),
            Command::SetFontFamily(family) => return marks::set_font_family(state, family),
            Command::UnsetFontFamily => marks::unset_font_family(state),
            Command::DeleteRange { from, to } => return content::delete_range_command(state, *from, *to),
            Command::InsertContentAt { pos, content } => {
                return content::insert_content_at(state, *pos, content);
            }
            Command::InsertText(text) => return content::insert_text(state, text),
            Command::DeleteBackward => return content::delete_backward(state),
            Command::Chain(steps) => return apply_chain(state, steps),
        };
        Ok(tx)
    }

    /// Whether the command would apply to `state` without error.
    pub fn can(&self, state: &EditorState) -> bool {
        matches!(self.apply(state), Ok(Some(_)))
    }

    pub fn is_table_command(&self) -> bool {
        matches!(
            self,
            Command::AddColumnBefore
                | Command::AddColumnAfter
                | Command::AddRowBefore
                | Command::AddRowAfter
                | Command::DeleteColumn
                | Command::DeleteRow
                | Command::DeleteTable
                | Command::SetTableWidth(_)
                | Command::SetCellWidth(_)
        )
    }
}

/// Steps that do not apply are skipped; the chain applies when any step did.
/// An error in any step aborts the whole chain.
fn apply_chain(state: &EditorState, steps: &[Command]) -> Result<Option<Transaction>, CommandError> {
    let mut current = state.clone();
    let mut applied = false;
    let mut doc_changed = false;
    for step in steps {
        if let Some(tx) = step.apply(&current)? {
            applied = true;
            doc_changed |= tx.doc_changed;
            current = tx.state;
        } else {
            log::trace!("Chain step {step:?} did not apply");
        }
    }
    Ok(applied.then_some(Transaction {
        state: current,
        doc_changed,
    }))
}
