//! Documentation manifest types.
//!
//! The manifest lists categorized instruction fragments, each included in the
//! generated installation document unconditionally (`always`) or when its
//! `when` expression holds against the final state.

use serde::{Deserialize, Serialize};

/// Priority used when a category or instruction does not declare one.
pub const DEFAULT_PRIORITY: i64 = 99;

/// Top-level manifest document: `{ "documentation": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsManifest {
    pub documentation: Documentation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    /// Heading of the generated document.
    pub title: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// A section of the generated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

/// One candidate fragment of the generated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Identity; later occurrences of an already included id are skipped.
    pub id: String,
    /// Category id this instruction is grouped under.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default)]
    pub always: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Rendered as a sub-heading above the fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Fragment path, relative to the docs directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Instruction {
    pub fn effective_priority(&self) -> i64 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}
