/*!
 * # Editing Core
 *
 * Every change to a document goes through a [`Command`]. A command is a pure
 * function from an [`EditorState`] (document, selection, stored marks) to a
 * [`Transaction`] holding the next state:
 *
 * ```text
 * Command::apply(&state) -> Result<Option<Transaction>, CommandError>
 *                                  │     │
 *                                  │     └── None: command does not apply here
 *                                  └──────── Err: invalid arguments
 * ```
 *
 * The editor facade then settles the transaction: identity backfill, history,
 * version bump and change notification, in that order.
 *
 * ## Module Structure
 *
 * - **`commands`**: the `Command` enum and chain semantics
 * - **`content`**: text insertion, range deletion, block insertion
 * - **`structure`**: block type changes, list/blockquote wrapping and lifting
 * - **`table`**: row/column operations around the caret's cell
 * - **`marks`**: inline formatting and the font registry
 * - **`identity`**: stable block ids
 * - **`history`**: undo/redo snapshots
 * - **`selection`**, **`state`**, **`patch`**: the data passed around
 *
 * ## Usage Pattern
 *
 * ```rust
 * use note_editor_engine::editing::{Command, EditorState};
 * use note_editor_engine::model::Document;
 *
 * let doc = Document::from_markup("<p>Hello</p>").unwrap();
 * let state = EditorState::new(doc);
 * let tx = Command::ToggleBulletList.apply(&state).unwrap().unwrap();
 * assert_eq!(tx.doc().to_markup(), "<ul><li><p>Hello</p></li></ul>");
 * ```
 */

pub mod commands;
mod content;
pub mod history;
pub mod identity;
pub mod marks;
pub mod patch;
pub mod selection;
pub mod state;
mod structure;
mod table;

pub use commands::Command;
pub use content::InsertContent;
pub use history::History;
pub use identity::{IdGenerator, IdentityAssigner, RandomIdGenerator, SequentialIdGenerator};
pub use marks::{FONT_FAMILIES, FontChoice, font_choice};
pub use patch::Patch;
pub use selection::Selection;
pub use state::{EditorState, Transaction};
