use super::Selection;

/// Result of dispatching a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub doc_changed: bool,
    pub new_selection: Selection,
    /// Incremented on each document change
    pub version: u64,
    /// Ids backfilled while settling the change
    pub assigned_ids: usize,
}
