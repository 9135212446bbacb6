//! Loads a scripted answers file for non-interactive runs.

use std::path::Path;

use anyhow::{Context, Result};

use wayfinder_core::input::ScriptedPrompter;
use wayfinder_core::ports::parse_structured;

/// Read a JSON or YAML answers file (YAML when the extension says so).
pub async fn load_answers(path: &Path) -> Result<ScriptedPrompter> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read answers file {}", path.display()))?;
    let value = parse_structured(&path.to_string_lossy(), &text)?;
    let prompter = ScriptedPrompter::from_value(value)
        .with_context(|| format!("invalid answers file {}", path.display()))?;
    Ok(prompter)
}
