use serde::{Deserialize, Serialize};

/// Tunables for parsing, normalization and reconciliation.
///
/// Every field has a default, so a partial `[editor]` table in the config
/// file is enough.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    pub parse: ParseOptions,
    pub reconcile: ReconcileOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Spaces per list nesting level, read by the block parser and written by
    /// the normalizer.
    pub list_indent: usize,
    pub extensions: Extensions,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            list_indent: 2,
            extensions: Extensions::default(),
        }
    }
}

impl ParseOptions {
    /// Nesting depth for a line with `indent` leading spaces.
    pub fn depth_for(&self, indent: usize) -> usize {
        indent / self.list_indent.max(1)
    }
}

/// Dialect extensions beyond the core block and inline grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub tables: bool,
    pub task_lists: bool,
    pub strikethrough: bool,
    pub footnotes: bool,
    pub emoji: bool,
    pub autolinks: bool,
}

impl Default for Extensions {
    fn default() -> Self {
        Self {
            tables: true,
            task_lists: true,
            strikethrough: true,
            footnotes: true,
            emoji: true,
            autolinks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Minimum score for a previous node to donate its id.
    pub threshold: f64,
    /// Start positions closer than this many bytes score a proximity bonus.
    pub position_window: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            position_window: 50,
        }
    }
}
