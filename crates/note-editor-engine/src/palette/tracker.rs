//! Watches the caret and decides when the palette opens, filters or closes.

use std::ops::Range;

use crate::editing::Selection;
use crate::model::Document;
use crate::options::PaletteOptions;
use crate::surface::ScreenPosition;

use super::SlashPalette;

/// What the tracker knows about the caret after a selection change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorFacts {
    pub caret: usize,
    /// Up to `window` characters of the caret's textblock, ending at the caret
    pub text_before: String,
}

/// Facts for a collapsed selection inside a textblock; `None` otherwise.
pub fn observe(doc: &Document, selection: Selection, window: usize) -> Option<CursorFacts> {
    if !selection.is_empty() {
        return None;
    }
    let caret = selection.from();
    let (block, offset) = doc.textblock_at(caret)?;
    let start = block.content_start() + offset.saturating_sub(window);
    Some(CursorFacts {
        caret,
        text_before: doc.text_between(start, caret, ""),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    Opened,
    QueryChanged(String),
    Closed,
    Unchanged,
}

/// The open/filter/close rules of the slash palette.
#[derive(Debug, Clone)]
pub struct SlashTrigger {
    trigger: char,
    max_query_len: usize,
}

impl Default for SlashTrigger {
    fn default() -> Self {
        Self::new(&PaletteOptions::default())
    }
}

impl SlashTrigger {
    pub fn new(options: &PaletteOptions) -> Self {
        Self {
            trigger: options.trigger,
            max_query_len: options.max_query_len,
        }
    }

    /// Characters of lookback the tracker needs.
    pub fn window(&self) -> usize {
        self.max_query_len + 1
    }

    /// Text after the last trigger in `text_before`, if the trigger is there.
    pub fn query<'a>(&self, text_before: &'a str) -> Option<&'a str> {
        text_before
            .rsplit_once(self.trigger)
            .map(|(_, query)| query)
            .filter(|query| query.chars().count() <= self.max_query_len)
    }

    /// Positions of the trigger plus query ending at the caret.
    pub fn query_range(&self, facts: &CursorFacts) -> Option<Range<usize>> {
        let query = self.query(&facts.text_before)?;
        let len = query.chars().count() + 1;
        Some(facts.caret - len..facts.caret)
    }

    /// Apply one selection change to the palette.
    ///
    /// `facts` is `None` for a non-empty selection or a caret outside text,
    /// both of which close the palette. `anchor` is only measured on opening.
    pub fn update(
        &self,
        palette: &mut SlashPalette,
        facts: Option<&CursorFacts>,
        anchor: impl FnOnce() -> ScreenPosition,
    ) -> TriggerEvent {
        let Some(facts) = facts else {
            if palette.is_open() {
                palette.close();
                return TriggerEvent::Closed;
            }
            return TriggerEvent::Unchanged;
        };

        if !palette.is_open() {
            if facts.text_before.ends_with(self.trigger) {
                palette.open(anchor());
                if palette.is_open() {
                    return TriggerEvent::Opened;
                }
            }
            return TriggerEvent::Unchanged;
        }

        match self.query(&facts.text_before) {
            Some(query) if palette.query() != Some(query) => {
                palette.set_query(query);
                TriggerEvent::QueryChanged(query.to_string())
            }
            Some(_) => TriggerEvent::Unchanged,
            None => {
                palette.close();
                TriggerEvent::Closed
            }
        }
    }
}
