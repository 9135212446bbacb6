//! Writes generated artifacts into the output directory.

use std::path::{Path, PathBuf};

use wayfinder_core::ports::ArtifactStore;
use wayfinder_types::error::PersistenceError;

/// Local filesystem implementation of [`ArtifactStore`].
///
/// All operations go through `tokio::fs`. The output directory is created on
/// first write.
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn save(&self, name: &str, content: &[u8]) -> Result<PathBuf, PersistenceError> {
        let path = self.dir.join(name);
        let failed = |e: std::io::Error| PersistenceError {
            name: name.to_string(),
            message: format!("{}: {e}", path.display()),
        };

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(failed)?;
        }
        tokio::fs::write(&path, content).await.map_err(failed)?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "Saved artifact");
        Ok(path)
    }
}
