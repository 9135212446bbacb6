//! Definition sources: the wizard's flow, manifest, template and fragments
//! served over HTTP or read from a local directory.

pub mod http;
pub mod local;

use std::time::Duration;

use wayfinder_core::ports::DefinitionSource;
use wayfinder_types::config::WizardConfig;
use wayfinder_types::error::FetchError;

pub use http::HttpSource;
pub use local::LocalSource;

/// The source selected by the `source` setting.
pub enum AnySource {
    Http(HttpSource),
    Local(LocalSource),
}

impl AnySource {
    /// An [`HttpSource`] for `http(s)://` sources, a [`LocalSource`] otherwise.
    pub fn from_config(config: &WizardConfig) -> Result<Self, FetchError> {
        if config.is_remote_source() {
            let timeout = Duration::from_secs(config.http_timeout_secs);
            Ok(Self::Http(HttpSource::new(&config.source, timeout)?))
        } else {
            Ok(Self::Local(LocalSource::new(&config.source)))
        }
    }

    /// Human readable location, for logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Http(source) => source.base_url().to_string(),
            Self::Local(source) => source.root().display().to_string(),
        }
    }
}

impl DefinitionSource for AnySource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        match self {
            Self::Http(source) => source.fetch_text(path).await,
            Self::Local(source) => source.fetch_text(path).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_picks_source_kind() {
        let mut config = WizardConfig::default();
        assert!(matches!(AnySource::from_config(&config).unwrap(), AnySource::Local(_)));

        config.source = "https://wizard.example/v1/".to_string();
        let source = AnySource::from_config(&config).unwrap();
        assert!(matches!(source, AnySource::Http(_)));
        assert_eq!(source.describe(), "https://wizard.example/v1");
    }
}
