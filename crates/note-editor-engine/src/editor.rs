//! The editor facade: one document, its selection, history and palette.
//!
//! Every document change goes through the same pipeline:
//!
//! ```text
//! command ─▶ transaction ─▶ history ─▶ id backfill ─▶ version ─▶ paint + on_change
//!                                                                    │
//!                                         palette tracker ◀──────────┘
//! ```
//!
//! The change callback therefore always sees the document with every
//! tracked block carrying an id.

use std::time::Duration;

use crate::editing::{
    Command, EditorState, History, IdentityAssigner, InsertContent, Patch, Selection, Transaction,
};
use crate::error::CommandError;
use crate::model::{BlockId, Document};
use crate::options::EditorOptions;
use crate::outline::{OutlineEntry, outline};
use crate::palette::{KeyOutcome, PaletteKey, SlashAction, SlashPalette, SlashTrigger, observe};
use crate::surface::{EditorSurface, HeadlessSurface};

type ChangeCallback = Box<dyn FnMut(&str)>;

pub struct Editor<S: EditorSurface = HeadlessSurface> {
    state: EditorState,
    options: EditorOptions,
    identity: IdentityAssigner,
    history: History,
    palette: SlashPalette,
    trigger: SlashTrigger,
    surface: S,
    on_change: Option<ChangeCallback>,
    version: u64,
    focused: bool,
    painted: bool,
}

impl Editor<HeadlessSurface> {
    /// An editor with default options and no display.
    pub fn headless(initial_content: &str) -> Self {
        Self::new(initial_content, EditorOptions::default(), HeadlessSurface::default())
    }
}

impl<S: EditorSurface> Editor<S> {
    /// Mount an editor on `initial_content`.
    ///
    /// Malformed content is logged and replaced by an empty document. Ids are
    /// assigned without notifying the change callback.
    pub fn new(initial_content: &str, options: EditorOptions, surface: S) -> Self {
        let identity = IdentityAssigner::from_options(&options.identity);
        Self::with_identity(initial_content, options, surface, identity)
    }

    pub fn with_identity(
        initial_content: &str,
        options: EditorOptions,
        surface: S,
        mut identity: IdentityAssigner,
    ) -> Self {
        let mut doc = Document::from_markup_or_empty(initial_content);
        identity.assign(&mut doc);
        let mut editor = Self {
            state: EditorState::new(doc),
            history: History::new(options.history.depth),
            palette: SlashPalette::default(),
            trigger: SlashTrigger::new(&options.palette),
            identity,
            surface,
            on_change: None,
            version: 0,
            focused: false,
            painted: false,
            options,
        };
        if editor.options.immediately_render {
            editor.paint();
        }
        editor
    }

    /// Register the callback receiving the serialized document after each
    /// change.
    pub fn set_on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn get_content(&self) -> String {
        self.state.doc.to_markup()
    }

    /// Replace the document. History is discarded and the change callback is
    /// not invoked.
    pub fn set_content(&mut self, markup: &str) {
        let mut doc = Document::from_markup_or_empty(markup);
        self.identity.assign(&mut doc);
        self.state = EditorState::new(doc);
        self.history.clear();
        self.palette.close();
        self.version += 1;
        self.paint();
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.state.doc
    }

    pub fn selection(&self) -> Selection {
        self.state.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn palette(&self) -> &SlashPalette {
        &self.palette
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Perform the first paint if mounting deferred it.
    pub fn render(&mut self) {
        if !self.painted {
            self.paint();
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.surface.focus();
    }

    /// Losing focus closes the palette.
    pub fn blur(&mut self) {
        self.focused = false;
        self.palette.close();
    }

    /// A pointer press outside the palette closes it.
    pub fn click_outside_palette(&mut self) {
        self.palette.close();
    }

    pub fn set_selection(&mut self, selection: Selection) -> Result<(), CommandError> {
        selection.validate(&self.state.doc)?;
        self.state.selection = selection.normalize(&self.state.doc);
        self.state.stored_marks = None;
        self.focused = true;
        self.sync_palette();
        Ok(())
    }

    pub fn can(&self, command: &Command) -> bool {
        command.can(&self.state)
    }

    /// Apply `command` and settle the result. `Ok(None)` when it does not
    /// apply.
    pub fn run(&mut self, command: Command) -> Result<Option<Patch>, CommandError> {
        self.focused = true;
        let Some(tx) = command.apply(&self.state)? else {
            log::trace!("Command {command:?} did not apply");
            return Ok(None);
        };
        Ok(Some(self.dispatch(tx)))
    }

    /// Type `text` one character at a time, as keystrokes would.
    pub fn type_text(&mut self, text: &str) -> Result<(), CommandError> {
        for c in text.chars() {
            self.run(Command::InsertText(c.to_string()))?;
        }
        Ok(())
    }

    pub fn backspace(&mut self) -> Result<Option<Patch>, CommandError> {
        self.run(Command::DeleteBackward)
    }

    /// Offer a key to the palette. Returns whether it was consumed.
    pub fn handle_key(&mut self, key: PaletteKey) -> Result<bool, CommandError> {
        match self.palette.handle_key(key) {
            KeyOutcome::Ignored => Ok(false),
            KeyOutcome::Navigated(_) | KeyOutcome::Dismissed => Ok(true),
            KeyOutcome::Invoke(action) => {
                self.execute_slash(action)?;
                Ok(true)
            }
        }
    }

    /// Execute the `index`-th filtered palette entry, as a click would.
    pub fn click_command(&mut self, index: usize) -> Result<Option<Patch>, CommandError> {
        match self.palette.action_at(index) {
            Some(action) => self.execute_slash(action),
            None => Ok(None),
        }
    }

    /// Remove the trigger and query, then run the entry's command, as one
    /// change.
    fn execute_slash(&mut self, action: SlashAction) -> Result<Option<Patch>, CommandError> {
        let range = observe(&self.state.doc, self.state.selection, self.trigger.window())
            .and_then(|facts| self.trigger.query_range(&facts));
        self.palette.close();

        let mut steps = Vec::with_capacity(2);
        if let Some(range) = range {
            steps.push(Command::DeleteRange {
                from: range.start,
                to: range.end,
            });
        }
        steps.push(action.command());
        log::debug!("Executing slash command {action:?}");
        self.run(Command::Chain(steps))
    }

    pub fn undo(&mut self) -> Option<Patch> {
        let (doc, selection) = self.history.undo((&self.state.doc, self.state.selection))?;
        Some(self.restore(doc, selection))
    }

    pub fn redo(&mut self) -> Option<Patch> {
        let (doc, selection) = self.history.redo((&self.state.doc, self.state.selection))?;
        Some(self.restore(doc, selection))
    }

    /// Select, scroll to and briefly highlight the block carrying `id`.
    pub fn scroll_to_block(&mut self, id: &BlockId) -> bool {
        let Some((_, pos)) = self.state.doc.find_block(id) else {
            log::debug!("No block with id {id}");
            return false;
        };
        self.state.selection = Selection::near(&self.state.doc, pos + 1);
        self.state.stored_marks = None;
        self.focus();
        self.surface.scroll_into_view(pos);
        self.surface
            .highlight_block(id, Duration::from_millis(self.options.highlight.duration_ms));
        self.sync_palette();
        true
    }

    /// Insert an empty paragraph right after the block carrying `id`.
    pub fn add_block_after(&mut self, id: &BlockId) -> Result<Option<Patch>, CommandError> {
        let Some((path, pos)) = self.state.doc.find_block(id) else {
            return Ok(None);
        };
        let size = self.state.doc.node_at(&path).map_or(0, |node| node.node_size());
        self.run(Command::InsertContentAt {
            pos: pos + size,
            content: InsertContent::Markup("<p></p>".to_string()),
        })
    }

    pub fn outline(&self) -> Vec<OutlineEntry> {
        outline(&self.state.doc)
    }

    /// Tear down: the palette closes for good and the callback is dropped.
    pub fn destroy(mut self) {
        self.on_change = None;
        self.palette.destroy();
    }

    fn dispatch(&mut self, tx: Transaction) -> Patch {
        let Transaction {
            mut state,
            doc_changed,
        } = tx;
        let mut assigned_ids = 0;
        if doc_changed {
            self.history.record(&self.state.doc, self.state.selection);
            assigned_ids = self.identity.assign(&mut state.doc);
            self.version += 1;
        }
        self.state = state;
        if doc_changed {
            self.emit();
        }
        self.sync_palette();
        Patch {
            doc_changed,
            new_selection: self.state.selection,
            version: self.version,
            assigned_ids,
        }
    }

    fn restore(&mut self, doc: Document, selection: Selection) -> Patch {
        let selection = selection.normalize(&doc);
        self.state = EditorState {
            doc,
            selection,
            stored_marks: None,
        };
        self.version += 1;
        self.emit();
        self.sync_palette();
        Patch {
            doc_changed: true,
            new_selection: selection,
            version: self.version,
            assigned_ids: 0,
        }
    }

    fn paint(&mut self) {
        let markup = self.state.doc.to_markup();
        self.surface.paint(&markup);
        self.painted = true;
    }

    fn emit(&mut self) {
        let markup = self.state.doc.to_markup();
        self.surface.paint(&markup);
        self.painted = true;
        if let Some(callback) = self.on_change.as_mut() {
            callback(&markup);
        }
    }

    fn sync_palette(&mut self) {
        if !self.focused {
            self.palette.close();
            return;
        }
        let facts = observe(&self.state.doc, self.state.selection, self.trigger.window());
        let (surface, doc, selection) = (&self.surface, &self.state.doc, self.state.selection);
        let event = self
            .trigger
            .update(&mut self.palette, facts.as_ref(), || surface.measure_caret(doc, selection));
        log::trace!("Palette tracker: {event:?}");
    }
}

impl<S: EditorSurface> Drop for Editor<S> {
    fn drop(&mut self) {
        self.palette.destroy();
    }
}
