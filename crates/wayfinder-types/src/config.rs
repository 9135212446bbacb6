//! Wizard configuration types.
//!
//! `WizardConfig` represents `wayfinder.toml`: where the flow, docs manifest
//! and config template live, and where generated artifacts are written.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a wizard session.
///
/// All fields have sensible defaults, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Base URL (`http://` / `https://`) or local directory holding the
    /// flow, manifest, template and fragments.
    pub source: String,
    /// Flow definition path, relative to `source`.
    pub flow_path: String,
    /// Docs manifest path, relative to `source`.
    pub docs_manifest_path: String,
    /// Config template path, relative to `source`.
    pub template_path: String,
    /// Directory that instruction `file` references are relative to.
    pub docs_dir: String,
    /// Directory generated artifacts are written to.
    pub output_dir: String,
    /// File name of the generated installation document.
    pub document_name: String,
    /// File name of the artifact returned by delivery.
    pub artifact_name: String,
    /// Per-request timeout for HTTP fetches and delivery.
    pub http_timeout_secs: u64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            source: ".".to_string(),
            flow_path: "flow.json".to_string(),
            docs_manifest_path: "docs/manifest.json".to_string(),
            template_path: "template.jexl".to_string(),
            docs_dir: "docs".to_string(),
            output_dir: ".".to_string(),
            document_name: "INSTALL.md".to_string(),
            artifact_name: "config.bin".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl WizardConfig {
    /// Whether `source` points at an HTTP server rather than a directory.
    pub fn is_remote_source(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}
