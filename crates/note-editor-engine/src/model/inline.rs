//! Inline content: text runs carrying mark sets.
//!
//! Offsets in this module are character offsets inside one textblock. Every
//! mutating helper leaves the run list normalized: no empty runs and no two
//! neighbours with equal marks.

use serde::{Deserialize, Serialize};

/// Formatting applied to a range of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    FontFamily(String),
}

/// Mark identity without its value, used for toggling and lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkType {
    Bold,
    Italic,
    Strike,
    FontFamily,
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Strike => MarkType::Strike,
            Mark::FontFamily(_) => MarkType::FontFamily,
        }
    }
}

/// At most one mark per [`MarkType`], kept in rank order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        let mut set = Self::new();
        for mark in marks {
            set.add(mark);
        }
        set
    }

    /// Insert a mark, replacing any mark of the same type.
    pub fn add(&mut self, mark: Mark) {
        let ty = mark.mark_type();
        match self.0.binary_search_by_key(&ty, Mark::mark_type) {
            Ok(index) => self.0[index] = mark,
            Err(index) => self.0.insert(index, mark),
        }
    }

    pub fn remove(&mut self, ty: MarkType) {
        self.0.retain(|mark| mark.mark_type() != ty);
    }

    pub fn contains(&self, ty: MarkType) -> bool {
        self.get(ty).is_some()
    }

    pub fn get(&self, ty: MarkType) -> Option<&Mark> {
        self.0.iter().find(|mark| mark.mark_type() == ty)
    }

    pub fn font_family(&self) -> Option<&str> {
        match self.get(MarkType::FontFamily) {
            Some(Mark::FontFamily(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mark> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A span of text sharing one mark set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub marks: MarkSet,
}

impl TextRun {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, MarkSet::new())
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

pub fn inline_len(runs: &[TextRun]) -> usize {
    runs.iter().map(TextRun::len).sum()
}

pub fn inline_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Merge neighbours with equal marks and drop empty runs.
pub fn normalize(runs: &mut Vec<TextRun>) {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

pub fn split_runs(runs: Vec<TextRun>, at: usize) -> (Vec<TextRun>, Vec<TextRun>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut seen = 0;
    for run in runs {
        let len = run.len();
        if seen + len <= at {
            left.push(run);
        } else if seen >= at {
            right.push(run);
        } else {
            let cut = byte_offset(&run.text, at - seen);
            left.push(TextRun::new(&run.text[..cut], run.marks.clone()));
            right.push(TextRun::new(&run.text[cut..], run.marks));
        }
        seen += len;
    }
    (left, right)
}

pub fn slice_runs(runs: &[TextRun], from: usize, to: usize) -> Vec<TextRun> {
    let (_, rest) = split_runs(runs.to_vec(), from);
    let (middle, _) = split_runs(rest, to.saturating_sub(from));
    middle
}

pub fn insert_text(runs: &mut Vec<TextRun>, at: usize, text: &str, marks: MarkSet) {
    insert_runs(runs, at, vec![TextRun::new(text, marks)]);
}

pub fn insert_runs(runs: &mut Vec<TextRun>, at: usize, inserted: Vec<TextRun>) {
    let (mut left, right) = split_runs(std::mem::take(runs), at);
    left.extend(inserted);
    left.extend(right);
    normalize(&mut left);
    *runs = left;
}

pub fn delete_text(runs: &mut Vec<TextRun>, from: usize, to: usize) {
    let (mut left, rest) = split_runs(std::mem::take(runs), from);
    let (_, right) = split_runs(rest, to.saturating_sub(from));
    left.extend(right);
    normalize(&mut left);
    *runs = left;
}

/// Apply `update` to the marks of every character in `from..to`.
pub fn update_marks(
    runs: &mut Vec<TextRun>,
    from: usize,
    to: usize,
    update: impl Fn(&mut MarkSet),
) {
    let (mut left, rest) = split_runs(std::mem::take(runs), from);
    let (mut middle, right) = split_runs(rest, to.saturating_sub(from));
    for run in &mut middle {
        update(&mut run.marks);
    }
    left.extend(middle);
    left.extend(right);
    normalize(&mut left);
    *runs = left;
}

/// Marks a character typed at `at` would inherit: those of the character
/// before it, or of the first character when `at` is the start.
pub fn marks_at(runs: &[TextRun], at: usize) -> MarkSet {
    let mut seen = 0;
    for run in runs {
        let len = run.len();
        if (at > 0 && at <= seen + len) || (at == 0 && len > 0) {
            return run.marks.clone();
        }
        seen += len;
    }
    MarkSet::new()
}

/// Whether every character in `from..to` carries a mark of type `ty`.
///
/// Returns `None` when the range covers no characters.
pub fn range_has_mark(runs: &[TextRun], from: usize, to: usize, ty: MarkType) -> Option<bool> {
    let mut seen = 0;
    let mut covered = false;
    for run in runs {
        let len = run.len();
        let overlaps = seen < to && from < seen + len;
        if overlaps {
            covered = true;
            if !run.marks.contains(ty) {
                return Some(false);
            }
        }
        seen += len;
    }
    covered.then_some(true)
}

/// Remove every mark, leaving a single plain run.
pub fn strip_marks(runs: &mut Vec<TextRun>) {
    for run in runs.iter_mut() {
        run.marks = MarkSet::new();
    }
    normalize(runs);
}
