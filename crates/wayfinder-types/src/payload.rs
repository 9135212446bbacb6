//! The structured result of the config template.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload produced by evaluating the config template against the final state.
///
/// `url` is where the delivery client submits `body`; templates written
/// against older manifests may call it `target`. Extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    #[serde(alias = "target")]
    pub url: String,
    pub body: Value,
    /// Overrides the configured artifact file name when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}
