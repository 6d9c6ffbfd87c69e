pub mod editing;
pub mod editor;
pub mod error;
pub mod model;
pub mod options;
pub mod outline;
pub mod palette;
pub mod surface;

// Re-export key types for easier usage
pub use editing::{Command, EditorState, InsertContent, Patch, Selection, Transaction};
pub use editor::Editor;
pub use error::{CommandError, ParseError};
pub use model::{BlockId, BlockKind, BlockNode, Document, HeadingLevel, Mark, MarkSet, MarkType, TextRun};
pub use options::EditorOptions;
pub use outline::{OutlineEntry, filter_outline};
pub use palette::{CommandDescriptor, KeyOutcome, PaletteKey, SlashAction, SlashPalette, default_registry};
pub use surface::{EditorSurface, HeadlessSurface, ScreenPosition};
