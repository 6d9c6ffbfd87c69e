//! # Slash-command palette
//!
//! A floating menu opened by typing the trigger character. The palette owns
//! only UI state: where it is anchored, the query typed after the trigger and
//! which entry is highlighted. Opening and closing is driven by the
//! [`tracker`], executing an entry by the editor.
//!
//! ```text
//!            trigger typed              query no longer matches,
//!   Idle ───────────────────▶ Open ───▶ Escape, blur, click outside,
//!    ▲                         │        entry executed
//!    └─────────────────────────┘
//! ```

use serde::Serialize;

use crate::editing::Command;
use crate::model::HeadingLevel;
use crate::surface::ScreenPosition;

pub mod tracker;

pub use tracker::{CursorFacts, SlashTrigger, TriggerEvent, observe};

/// What a palette entry does when executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SlashAction {
    Paragraph,
    Heading(HeadingLevel),
    BulletList,
    OrderedList,
    CodeBlock,
    Blockquote,
    HorizontalRule,
    Table {
        rows: usize,
        cols: usize,
        with_header_row: bool,
    },
}

impl SlashAction {
    pub fn command(&self) -> Command {
        match self {
            SlashAction::Paragraph => Command::SetParagraph,
            SlashAction::Heading(level) => {
                Command::Chain(vec![Command::ClearNodes, Command::SetHeading(*level)])
            }
            SlashAction::BulletList => Command::ToggleBulletList,
            SlashAction::OrderedList => Command::ToggleOrderedList,
            SlashAction::CodeBlock => Command::ToggleCodeBlock,
            SlashAction::Blockquote => Command::ToggleBlockquote,
            SlashAction::HorizontalRule => Command::SetHorizontalRule,
            SlashAction::Table {
                rows,
                cols,
                with_header_row,
            } => Command::InsertTable {
                rows: *rows,
                cols: *cols,
                with_header_row: *with_header_row,
            },
        }
    }
}

/// A palette entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    pub title: String,
    pub description: String,
    pub action: SlashAction,
}

impl CommandDescriptor {
    pub fn new(title: &str, description: &str, action: SlashAction) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            action,
        }
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query) || self.description.to_lowercase().contains(&query)
    }
}

/// The built-in entries, in display order.
pub fn default_registry() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new("텍스트", "일반 텍스트 블록", SlashAction::Paragraph),
        CommandDescriptor::new("제목 1", "큰 제목", SlashAction::Heading(HeadingLevel::H1)),
        CommandDescriptor::new("제목 2", "중간 제목", SlashAction::Heading(HeadingLevel::H2)),
        CommandDescriptor::new("제목 3", "작은 제목", SlashAction::Heading(HeadingLevel::H3)),
        CommandDescriptor::new("글머리 기호 목록", "간단한 글머리 기호 목록", SlashAction::BulletList),
        CommandDescriptor::new("번호 매기기 목록", "번호가 매겨진 목록", SlashAction::OrderedList),
        CommandDescriptor::new("코드 블록", "코드 조각을 위한 블록", SlashAction::CodeBlock),
        CommandDescriptor::new("인용문", "텍스트 인용하기", SlashAction::Blockquote),
        CommandDescriptor::new("구분선", "섹션 분리를 위한 수평선", SlashAction::HorizontalRule),
        CommandDescriptor::new(
            "표 삽입",
            "2x3 기본 표 삽입",
            SlashAction::Table {
                rows: 3,
                cols: 2,
                with_header_row: true,
            },
        ),
    ]
}

/// Entries matching `query`, in registry order.
pub fn filter_commands<'a>(registry: &'a [CommandDescriptor], query: &str) -> Vec<&'a CommandDescriptor> {
    registry.iter().filter(|descriptor| descriptor.matches(query)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKey {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not consumed; the editor should handle the key normally
    Ignored,
    Navigated(usize),
    Invoke(SlashAction),
    Dismissed,
}

impl KeyOutcome {
    pub fn consumed(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPalette {
    pub anchor: ScreenPosition,
    pub query: String,
    pub highlighted: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PaletteState {
    #[default]
    Idle,
    Open(OpenPalette),
}

pub struct SlashPalette {
    registry: Vec<CommandDescriptor>,
    state: PaletteState,
    destroyed: bool,
}

impl Default for SlashPalette {
    fn default() -> Self {
        Self::new(default_registry())
    }
}

impl SlashPalette {
    pub fn new(registry: Vec<CommandDescriptor>) -> Self {
        Self {
            registry,
            state: PaletteState::Idle,
            destroyed: false,
        }
    }

    pub fn registry(&self) -> &[CommandDescriptor] {
        &self.registry
    }

    pub fn state(&self) -> &PaletteState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, PaletteState::Open(_))
    }

    fn open_state(&self) -> Option<&OpenPalette> {
        match &self.state {
            PaletteState::Open(open) => Some(open),
            PaletteState::Idle => None,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.open_state().map(|open| open.query.as_str())
    }

    pub fn anchor(&self) -> Option<ScreenPosition> {
        self.open_state().map(|open| open.anchor)
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.open_state().map(|open| open.highlighted)
    }

    /// Open with an empty query. Does nothing once destroyed.
    pub fn open(&mut self, anchor: ScreenPosition) {
        if self.destroyed {
            return;
        }
        log::debug!("Opening slash palette at {anchor:?}");
        self.state = PaletteState::Open(OpenPalette {
            anchor,
            query: String::new(),
            highlighted: 0,
        });
    }

    pub fn close(&mut self) {
        if self.is_open() {
            log::debug!("Closing slash palette");
        }
        self.state = PaletteState::Idle;
    }

    /// Close for good; later `open` calls are ignored.
    pub fn destroy(&mut self) {
        self.close();
        self.destroyed = true;
    }

    /// Replace the query. The highlight returns to the first entry when the
    /// query changes.
    pub fn set_query(&mut self, query: &str) {
        if let PaletteState::Open(open) = &mut self.state
            && open.query != query
        {
            open.query = query.to_string();
            open.highlighted = 0;
        }
    }

    /// Entries matching the current query; empty while idle.
    pub fn filtered(&self) -> Vec<&CommandDescriptor> {
        match self.query() {
            Some(query) => filter_commands(&self.registry, query),
            None => Vec::new(),
        }
    }

    /// Action of the `index`-th filtered entry, as chosen by a click.
    pub fn action_at(&self, index: usize) -> Option<SlashAction> {
        self.filtered().get(index).map(|descriptor| descriptor.action.clone())
    }

    pub fn handle_key(&mut self, key: PaletteKey) -> KeyOutcome {
        let PaletteState::Open(open) = &mut self.state else {
            return KeyOutcome::Ignored;
        };
        let filtered = filter_commands(&self.registry, &open.query);
        let count = filtered.len();
        match key {
            PaletteKey::ArrowDown => {
                if count > 0 {
                    open.highlighted = (open.highlighted + 1) % count;
                }
                KeyOutcome::Navigated(open.highlighted)
            }
            PaletteKey::ArrowUp => {
                if count > 0 {
                    open.highlighted = (open.highlighted + count - 1) % count;
                }
                KeyOutcome::Navigated(open.highlighted)
            }
            // Swallowed even with nothing to run.
            PaletteKey::Enter => match filtered.get(open.highlighted) {
                Some(descriptor) => KeyOutcome::Invoke(descriptor.action.clone()),
                None => KeyOutcome::Navigated(open.highlighted),
            },
            PaletteKey::Escape => {
                self.close();
                KeyOutcome::Dismissed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn titles(palette: &SlashPalette) -> Vec<&str> {
        palette.filtered().iter().map(|descriptor| descriptor.title.as_str()).collect()
    }

    fn open_palette() -> SlashPalette {
        let mut palette = SlashPalette::default();
        palette.open(ScreenPosition { top: 24.0, left: 8.0 });
        palette
    }

    #[test]
    fn test_default_registry_order() {
        let registry = default_registry();
        assert_eq!(registry.len(), 10);
        assert_eq!(registry[0].title, "텍스트");
        assert_eq!(
            registry[9].action,
            SlashAction::Table {
                rows: 3,
                cols: 2,
                with_header_row: true
            }
        );
    }

    #[test]
    fn test_filter_matches_title_or_description() {
        let registry = default_registry();
        let titles = |query: &str| -> Vec<String> {
            filter_commands(&registry, query)
                .iter()
                .map(|descriptor| descriptor.title.clone())
                .collect()
        };
        assert_eq!(titles("제목"), vec!["제목 1", "제목 2", "제목 3"]);
        assert_eq!(titles("수평선"), vec!["구분선"]);
        assert_eq!(titles("2X3"), vec!["표 삽입"]);
        assert_eq!(titles("").len(), 10);
        assert!(titles("te").is_empty());
    }

    #[test]
    fn test_navigation_wraps_around() {
        let mut palette = SlashPalette::new(default_registry().into_iter().take(9).collect());
        palette.open(ScreenPosition::default());
        assert_eq!(palette.handle_key(PaletteKey::ArrowUp), KeyOutcome::Navigated(8));
        assert_eq!(palette.handle_key(PaletteKey::ArrowDown), KeyOutcome::Navigated(0));
        for _ in 0..9 {
            palette.handle_key(PaletteKey::ArrowDown);
        }
        assert_eq!(palette.highlighted(), Some(0));
    }

    #[test]
    fn test_query_change_resets_highlight() {
        let mut palette = open_palette();
        palette.handle_key(PaletteKey::ArrowDown);
        palette.handle_key(PaletteKey::ArrowDown);
        assert_eq!(palette.highlighted(), Some(2));
        palette.set_query("제목");
        assert_eq!(palette.highlighted(), Some(0));
        assert_eq!(titles(&palette), vec!["제목 1", "제목 2", "제목 3"]);
    }

    #[test]
    fn test_enter_invokes_highlighted_entry() {
        let mut palette = open_palette();
        palette.set_query("제목");
        palette.handle_key(PaletteKey::ArrowDown);
        assert_eq!(
            palette.handle_key(PaletteKey::Enter),
            KeyOutcome::Invoke(SlashAction::Heading(HeadingLevel::H2))
        );
    }

    #[test]
    fn test_empty_list_consumes_arrows_and_enter() {
        let mut palette = open_palette();
        palette.set_query("zzz");
        assert!(palette.filtered().is_empty());
        assert_eq!(palette.handle_key(PaletteKey::ArrowDown), KeyOutcome::Navigated(0));
        assert_eq!(palette.handle_key(PaletteKey::Enter), KeyOutcome::Navigated(0));
        assert!(palette.handle_key(PaletteKey::Enter).consumed());
        assert!(palette.is_open());
    }

    #[test]
    fn test_escape_closes() {
        let mut palette = open_palette();
        assert_eq!(palette.handle_key(PaletteKey::Escape), KeyOutcome::Dismissed);
        assert!(!palette.is_open());
        assert_eq!(palette.handle_key(PaletteKey::Escape), KeyOutcome::Ignored);
    }

    #[test]
    fn test_destroyed_palette_stays_closed() {
        let mut palette = open_palette();
        palette.destroy();
        palette.open(ScreenPosition::default());
        assert!(!palette.is_open());
        assert!(palette.filtered().is_empty());
    }

    #[test]
    fn test_heading_action_clears_nodes_first() {
        assert_eq!(
            SlashAction::Heading(HeadingLevel::H3).command(),
            Command::Chain(vec![Command::ClearNodes, Command::SetHeading(HeadingLevel::H3)])
        );
        assert_eq!(SlashAction::Paragraph.command(), Command::SetParagraph);
    }
}
