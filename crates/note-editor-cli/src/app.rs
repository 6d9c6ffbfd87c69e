use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use note_editor_engine::model::TextPoint;
use note_editor_engine::{Command, Editor, EditorOptions, OutlineEntry, PaletteKey, Selection};
use ratatui::widgets::ListState;

use crate::surface::TerminalSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Document,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub editor: Editor<TerminalSurface>,
    pub path: PathBuf,
    pub pane: Pane,
    pub outline_state: ListState,
    pub status: String,
    pub scroll: usize,
    dirty: Rc<Cell<bool>>,
    /// Fixed end of a shift-extended selection
    anchor: Option<usize>,
}

impl App {
    /// Open `path`, or start an empty document there if it does not exist.
    pub fn open(path: PathBuf, options: EditorOptions) -> Result<Self> {
        let content = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read document {}", path.display()))?
        } else {
            log::info!("{} does not exist yet, starting empty", path.display());
            String::new()
        };

        let mut editor = Editor::new(&content, options, TerminalSurface::default());
        editor.render();
        editor.focus();

        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        editor.set_on_change(move |_| flag.set(true));

        Ok(Self {
            editor,
            status: format!("Editing {}", path.display()),
            path,
            pane: Pane::Document,
            outline_state: ListState::default(),
            scroll: 0,
            dirty,
            anchor: None,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.editor.outline()
    }

    pub fn save(&mut self) -> Result<()> {
        write_document(&self.path, &self.editor.get_content())?;
        self.dirty.set(false);
        self.status = format!("Saved {}", self.path.display());
        log::info!("Saved {}", self.path.display());
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<Flow> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') if ctrl => return Ok(Flow::Quit),
            KeyCode::Char('s') if ctrl => {
                self.save()?;
                return Ok(Flow::Continue);
            }
            KeyCode::Tab => {
                self.toggle_pane();
                return Ok(Flow::Continue);
            }
            _ => {}
        }
        match self.pane {
            Pane::Document => self.document_key(key)?,
            Pane::Outline => self.outline_key(key),
        }
        Ok(Flow::Continue)
    }

    fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Document => {
                self.editor.blur();
                if self.outline_state.selected().is_none() && !self.outline().is_empty() {
                    self.outline_state.select(Some(0));
                }
                Pane::Outline
            }
            Pane::Outline => {
                self.editor.focus();
                Pane::Document
            }
        };
    }

    fn document_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.editor.palette().is_open()
            && let Some(palette_key) = palette_key(key.code)
            && self.editor.handle_key(palette_key)?
        {
            return Ok(());
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let result = match key.code {
            KeyCode::Char('z') if ctrl => self.editor.undo().map(|_| ()).ok_or("Nothing to undo"),
            KeyCode::Char('y') if ctrl => self.editor.redo().map(|_| ()).ok_or("Nothing to redo"),
            KeyCode::Char('b') if ctrl => self.run(Command::ToggleBold),
            KeyCode::Char('k') if ctrl => self.run(Command::ToggleItalic),
            KeyCode::Char('d') if ctrl => self.run(Command::ToggleStrike),
            KeyCode::Char(c) if !ctrl => {
                self.anchor = None;
                self.editor.type_text(&c.to_string())?;
                Ok(())
            }
            KeyCode::Backspace => {
                self.anchor = None;
                self.editor.backspace()?;
                Ok(())
            }
            KeyCode::Enter => self.new_block_below(),
            KeyCode::Left => self.move_horizontally(false, shift),
            KeyCode::Right => self.move_horizontally(true, shift),
            KeyCode::Up => self.move_vertically(false),
            KeyCode::Down => self.move_vertically(true),
            KeyCode::F(5) => self.run(Command::AddRowAfter),
            KeyCode::F(6) => self.run(Command::AddColumnAfter),
            KeyCode::F(7) => self.run(Command::DeleteRow),
            KeyCode::F(8) => self.run(Command::DeleteColumn),
            KeyCode::F(9) => self.run(Command::DeleteTable),
            _ => Ok(()),
        };
        if let Err(message) = result {
            self.status = message.to_string();
        }
        Ok(())
    }

    fn outline_key(&mut self, key: KeyEvent) {
        let entries = self.outline();
        if entries.is_empty() {
            return;
        }
        let current = self.outline_state.selected().unwrap_or(0).min(entries.len() - 1);
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.outline_state.select(Some((current + 1) % entries.len()));
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.outline_state.select(Some((current + entries.len() - 1) % entries.len()));
            }
            KeyCode::Enter => {
                if self.editor.scroll_to_block(&entries[current].id) {
                    self.pane = Pane::Document;
                    self.anchor = None;
                }
            }
            KeyCode::Char('a') => {
                if let Err(err) = self.editor.add_block_after(&entries[current].id) {
                    self.status = err.to_string();
                }
            }
            _ => {}
        }
    }

    /// Run a command, reporting one that does not apply here.
    fn run(&mut self, command: Command) -> std::result::Result<(), &'static str> {
        match self.editor.run(command) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err("Not available here"),
            Err(err) => {
                log::warn!("Command failed: {err}");
                Err("Command failed")
            }
        }
    }

    /// Enter outside the palette opens an empty paragraph below the current
    /// one and moves the caret there.
    fn new_block_below(&mut self) -> std::result::Result<(), &'static str> {
        let doc = self.editor.document();
        let caret = self.editor.selection().to();
        let Some((block, _)) = doc.textblock_at(caret) else {
            return Err("Not available here");
        };
        let Some(id) = doc.node_at(&block.path).and_then(|node| node.id.clone()) else {
            return Err("Not available here");
        };
        let Some(point) = doc.text_point(caret) else {
            return Err("Not available here");
        };
        match self.editor.add_block_after(&id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err("Not available here"),
            Err(err) => {
                log::warn!("Adding a block failed: {err}");
                return Err("Command failed");
            }
        }
        let below = TextPoint {
            ordinal: point.ordinal + 1,
            offset: 0,
        };
        if let Some(pos) = self.editor.document().pos_at_point(below) {
            self.select(Selection::caret(pos));
        }
        Ok(())
    }

    fn move_horizontally(&mut self, forward: bool, extend: bool) -> std::result::Result<(), &'static str> {
        let selection = self.editor.selection();
        let doc = self.editor.document();
        let head = match self.anchor {
            Some(anchor) if anchor == selection.to() => selection.from(),
            _ => selection.to(),
        };
        let moved = if forward {
            doc.nearest_text_pos((head + 1).min(doc.content_size()), true)
        } else {
            doc.nearest_text_pos(head.saturating_sub(1), false)
        };
        if extend {
            let anchor = *self.anchor.get_or_insert(if head == selection.to() {
                selection.from()
            } else {
                selection.to()
            });
            self.select(Selection::range(anchor, moved));
        } else {
            self.anchor = None;
            self.select(Selection::caret(moved));
        }
        Ok(())
    }

    fn move_vertically(&mut self, down: bool) -> std::result::Result<(), &'static str> {
        let doc = self.editor.document();
        let Some(point) = doc.text_point(self.editor.selection().to()) else {
            return Ok(());
        };
        let ordinal = if down {
            point.ordinal + 1
        } else {
            match point.ordinal.checked_sub(1) {
                Some(ordinal) => ordinal,
                None => return Ok(()),
            }
        };
        if let Some(pos) = doc.pos_at_point(TextPoint {
            ordinal,
            offset: point.offset,
        }) {
            self.anchor = None;
            self.select(Selection::caret(pos));
        }
        Ok(())
    }

    fn select(&mut self, selection: Selection) {
        if let Err(err) = self.editor.set_selection(selection) {
            log::warn!("Rejected selection {selection:?}: {err}");
        }
    }
}

fn palette_key(code: KeyCode) -> Option<PaletteKey> {
    match code {
        KeyCode::Up => Some(PaletteKey::ArrowUp),
        KeyCode::Down => Some(PaletteKey::ArrowDown),
        KeyCode::Enter => Some(PaletteKey::Enter),
        KeyCode::Esc => Some(PaletteKey::Escape),
        _ => None,
    }
}

fn write_document(path: &Path, markup: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, markup).with_context(|| format!("Failed to write document {}", path.display()))
}
