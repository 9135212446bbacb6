//! Application state wiring the configuration to concrete infra adapters.

use std::time::Duration;

use anyhow::{Context, Result};

use wayfinder_core::pipeline::PipelineOptions;
use wayfinder_core::session::SourcePaths;
use wayfinder_infra::config::load_wizard_config;
use wayfinder_infra::delivery::HttpDelivery;
use wayfinder_infra::filesystem::LocalArtifactStore;
use wayfinder_infra::source::AnySource;
use wayfinder_types::config::WizardConfig;

use crate::cli::Cli;

/// Resolved configuration plus the definition source it selects.
pub struct AppState {
    pub config: WizardConfig,
    pub source: AnySource,
}

impl AppState {
    /// Load the config file, apply flag overrides, and open the definition
    /// source.
    pub async fn init(cli: &Cli) -> Result<Self> {
        let config = load_wizard_config(cli.config.as_deref())
            .await
            .context("failed to load configuration")?;
        let config = apply_cli_overrides(config, cli);

        let source = AnySource::from_config(&config).context("failed to open definition source")?;
        tracing::debug!(source = %source.describe(), "Using definition source");

        Ok(Self { config, source })
    }

    pub fn source_paths(&self) -> SourcePaths {
        SourcePaths::from(&self.config)
    }

    pub fn delivery(&self) -> Result<HttpDelivery> {
        HttpDelivery::new(Duration::from_secs(self.config.http_timeout_secs))
            .context("failed to create delivery client")
    }

    pub fn store(&self) -> LocalArtifactStore {
        LocalArtifactStore::new(&self.config.output_dir)
    }

    pub fn pipeline_options(&self, dry_run: bool, save_state: bool) -> PipelineOptions {
        PipelineOptions {
            document_name: self.config.document_name.clone(),
            artifact_name: self.config.artifact_name.clone(),
            dry_run,
            save_state,
        }
    }
}

/// Flags (and the environment variables backing them) win over the file.
fn apply_cli_overrides(mut config: WizardConfig, cli: &Cli) -> WizardConfig {
    if let Some(source) = &cli.source {
        config.source = source.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.display().to_string();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_flags_override_config_values() {
        let cli = Cli::try_parse_from([
            "wayfinder",
            "--source",
            "./wizard",
            "--output-dir",
            "out",
        ])
        .unwrap();
        let config = apply_cli_overrides(WizardConfig::default(), &cli);
        assert_eq!(config.source, "./wizard");
        assert_eq!(config.output_dir, "out");
        assert_eq!(config.docs_dir, "docs");
    }

    #[test]
    fn test_absent_flags_keep_config_values() {
        let cli = Cli::try_parse_from(["wayfinder", "validate"]).unwrap();
        let mut file = WizardConfig::default();
        file.source = "https://wizard.example".to_string();
        let config = apply_cli_overrides(file.clone(), &cli);
        assert_eq!(config, file);
    }
}
