//! Inline formatting commands and the font family registry.

use crate::error::CommandError;
use crate::model::{Mark, MarkSet, inline};

use super::{Command, EditorState, Transaction};

/// A font offered by the toolbar. `inherit` means "no font mark".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontChoice {
    pub name: &'static str,
    pub value: &'static str,
}

pub const INHERIT_FONT: &str = "inherit";

pub const FONT_FAMILIES: &[FontChoice] = &[
    FontChoice { name: "기본 폰트", value: INHERIT_FONT },
    FontChoice { name: "맑은 고딕", value: "'Malgun Gothic', sans-serif" },
    FontChoice { name: "나눔고딕", value: "'Nanum Gothic', sans-serif" },
    FontChoice { name: "돋움", value: "'Dotum', sans-serif" },
    FontChoice { name: "굴림", value: "'Gulim', sans-serif" },
    FontChoice { name: "바탕", value: "'Batang', serif" },
    FontChoice { name: "궁서", value: "'Gungsuh', serif" },
    FontChoice { name: "Arial", value: "'Arial', sans-serif" },
    FontChoice { name: "Times New Roman", value: "'Times New Roman', serif" },
    FontChoice { name: "Courier New", value: "'Courier New', monospace" },
    FontChoice { name: "Georgia", value: "'Georgia', serif" },
];

impl FontChoice {
    pub fn command(&self) -> Command {
        if self.value == INHERIT_FONT {
            Command::UnsetFontFamily
        } else {
            Command::SetFontFamily(self.value.to_string())
        }
    }
}

pub fn font_choice(name: &str) -> Option<&'static FontChoice> {
    FONT_FAMILIES.iter().find(|choice| choice.name == name)
}

/// Apply `update` to the marks of all selected text in blocks that allow
/// marks. Not applied when no run actually changes.
fn update_selected(state: &EditorState, update: impl Fn(&mut MarkSet)) -> Option<Transaction> {
    let selection = state.selection;
    let mut doc = state.doc.clone();
    let mut changed = false;
    for block in state.doc.textblocks() {
        let lo = selection.from().max(block.content_start());
        let hi = selection.to().min(block.content_end());
        if lo >= hi {
            continue;
        }
        let Some(node) = doc.node_at_mut(&block.path) else {
            continue;
        };
        if !node.kind.allows_marks() {
            continue;
        }
        if let Some(runs) = node.runs_mut() {
            let before = runs.clone();
            inline::update_marks(runs, lo - block.content_start(), hi - block.content_start(), &update);
            changed |= *runs != before;
        }
    }
    changed.then(|| Transaction::doc_change(doc, selection))
}

/// Marks for the caret, or `None` when the caret cannot carry marks.
fn caret_marks(state: &EditorState) -> Option<MarkSet> {
    state.active_block()?.allows_marks().then(|| state.caret_marks())
}

pub(crate) fn toggle_mark(state: &EditorState, mark: Mark) -> Option<Transaction> {
    let ty = mark.mark_type();
    if state.selection.is_empty() {
        let mut marks = caret_marks(state)?;
        if marks.contains(ty) {
            marks.remove(ty);
        } else {
            marks.add(mark);
        }
        return Some(Transaction::stored_marks(state, marks));
    }
    if state.is_mark_active(ty) {
        update_selected(state, |marks| marks.remove(ty))
    } else {
        update_selected(state, |marks| marks.add(mark.clone()))
    }
}

pub(crate) fn set_font_family(state: &EditorState, family: &str) -> Result<Option<Transaction>, CommandError> {
    let family = family.trim();
    if family.is_empty() {
        return Err(CommandError::InvalidFontFamily);
    }
    let mark = Mark::FontFamily(family.to_string());
    if state.selection.is_empty() {
        return Ok(caret_marks(state).map(|mut marks| {
            marks.add(mark);
            Transaction::stored_marks(state, marks)
        }));
    }
    Ok(update_selected(state, |marks| marks.add(mark.clone())))
}

pub(crate) fn unset_font_family(state: &EditorState) -> Option<Transaction> {
    if state.selection.is_empty() {
        let mut marks = caret_marks(state)?;
        marks.remove(crate::model::MarkType::FontFamily);
        return Some(Transaction::stored_marks(state, marks));
    }
    update_selected(state, |marks| marks.remove(crate::model::MarkType::FontFamily))
}
