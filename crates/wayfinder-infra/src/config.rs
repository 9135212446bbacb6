//! Wizard configuration loader.
//!
//! Looks for a TOML file in this order and uses the first one that exists:
//!
//! 1. the path given with `--config` (must exist and parse)
//! 2. `./wayfinder.toml`
//! 3. `{config_dir}/wayfinder/config.toml`
//!
//! Discovered files that fail to read or parse are logged and skipped in favor
//! of the defaults. `WAYFINDER_SOURCE` / `WAYFINDER_OUTPUT_DIR` are read by the
//! CLI flags they back, so they override the file along with the flags.

use std::path::{Path, PathBuf};

use wayfinder_types::config::WizardConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Default discovery locations, most specific first.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("wayfinder.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("wayfinder").join("config.toml"));
    }
    paths
}

/// Load the configuration from `explicit` or the default locations.
pub async fn load_wizard_config(explicit: Option<&Path>) -> Result<WizardConfig, ConfigError> {
    load_from(explicit, &default_config_paths()).await
}

/// Load from `explicit`, or from the first existing path of `candidates`.
pub async fn load_from(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
) -> Result<WizardConfig, ConfigError> {
    if let Some(path) = explicit {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        return toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        });
    }

    for path in candidates {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => {
                tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
                return Ok(WizardConfig::default());
            }
        };

        return match toml::from_str::<WizardConfig>(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(err) => {
                tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
                Ok(WizardConfig::default())
            }
        };
    }

    tracing::debug!("No config file found, using defaults");
    Ok(WizardConfig::default())
}
