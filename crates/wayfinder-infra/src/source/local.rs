//! Reads definitions from a local directory.

use std::path::{Path, PathBuf};

use wayfinder_core::ports::DefinitionSource;
use wayfinder_types::error::FetchError;

/// [`DefinitionSource`] reading files under a root directory via `tokio::fs`.
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DefinitionSource for LocalSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let full = self.root.join(path.trim_start_matches('/'));
        tracing::debug!(path = %full.display(), "Reading definition");

        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| FetchError::Io {
                path: path.to_string(),
                message: format!("{}: {e}", full.display()),
            })
    }
}
