use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// @module: Highlight color resolution

/// A background/foreground color pair for rendering a text highlight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    /// Background color as a hex string (e.g. "#FFFF99")
    pub background: String,
    /// Foreground (text) color as a hex string
    pub foreground: String,
}

impl ColorPair {
    /// Create a color pair from hex strings.
    pub fn new(background: impl Into<String>, foreground: impl Into<String>) -> Self {
        Self {
            background: background.into(),
            foreground: foreground.into(),
        }
    }

    /// The pair used when a color index has no mapping. White background,
    /// black text, matching an unhighlighted page.
    pub fn fallback() -> Self {
        Self::new("#FFFFFF", "#000000")
    }
}

/// Mapping from the store's small integer color index to a color pair.
///
/// The device only ever writes a handful of indices, but the map is
/// user-replaceable so unexpected keys must resolve to something sane.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorMap {
    entries: BTreeMap<i64, ColorPair>,
}

impl Default for ColorMap {
    fn default() -> Self {
        // Default device palette: yellow, pink, green, blue
        let mut entries = BTreeMap::new();
        entries.insert(0, ColorPair::new("#FFFF99", "#000000"));
        entries.insert(1, ColorPair::new("#FFB2C8", "#000000"));
        entries.insert(2, ColorPair::new("#B2E5B2", "#000000"));
        entries.insert(3, ColorPair::new("#B2D1FF", "#000000"));
        Self { entries }
    }
}

impl ColorMap {
    /// Create an empty color map. Every lookup resolves to the fallback pair.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert or replace the pair for an index.
    pub fn insert(&mut self, index: i64, pair: ColorPair) {
        self.entries.insert(index, pair);
    }

    /// Resolve a color index to a pair.
    ///
    /// An unknown index is not an error: the fixed fallback pair is returned
    /// and the second tuple element is set so the caller can surface that a
    /// fallback was used without interrupting the export.
    pub fn resolve(&self, index: i64) -> (ColorPair, bool) {
        match self.entries.get(&index) {
            Some(pair) => (pair.clone(), false),
            None => (ColorPair::fallback(), true),
        }
    }

    /// Number of configured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
