//! Tunables for an editor instance.
//!
//! Every field has a default, so a partial TOML table deserializes into a
//! complete [`EditorOptions`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Perform the first paint while mounting instead of on the first
    /// explicit render.
    pub immediately_render: bool,
    pub palette: PaletteOptions,
    pub identity: IdentityOptions,
    pub history: HistoryOptions,
    pub highlight: HighlightOptions,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            immediately_render: true,
            palette: PaletteOptions::default(),
            identity: IdentityOptions::default(),
            history: HistoryOptions::default(),
            highlight: HighlightOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    pub trigger: char,
    /// Longest query that keeps the palette open. The trigger must be found
    /// within `max_query_len + 1` characters before the caret.
    pub max_query_len: usize,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            trigger: '/',
            max_query_len: 19,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityOptions {
    pub prefix: String,
    /// Number of random base-36 characters after the prefix
    pub length: usize,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            prefix: "id-".to_string(),
            length: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryOptions {
    pub depth: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self { depth: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    pub duration_ms: u64,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self { duration_ms: 1000 }
    }
}
