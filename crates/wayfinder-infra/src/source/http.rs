//! Fetches definitions relative to a base URL.

use std::time::Duration;

use wayfinder_core::ports::DefinitionSource;
use wayfinder_types::error::FetchError;

/// [`DefinitionSource`] backed by a reqwest client.
///
/// Logical paths are joined onto the base URL. Non-2xx responses are
/// [`FetchError::Status`].
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wayfinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport {
                path: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl DefinitionSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let url = self.url_for(path);
        let transport = |e: reqwest::Error| FetchError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        };

        tracing::debug!(%url, "Fetching definition");
        let response = self.client.get(&url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::TestServer;
    use serde_json::json;

    fn source(server: &TestServer) -> HttpSource {
        HttpSource::new(&format!("{}/", server.base_url), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_for_joins_with_single_slash() {
        let source = HttpSource::new("https://wizard.example/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(source.url_for("flow.json"), "https://wizard.example/v1/flow.json");
        assert_eq!(source.url_for("/docs/a.md"), "https://wizard.example/v1/docs/a.md");
    }

    #[tokio::test]
    async fn test_fetches_text_and_structured_documents() {
        let server = TestServer::start(&[
            ("/flow.json", 200, r#"{"start": "a", "steps": {}}"#.as_bytes()),
            ("/docs/manifest.yaml", 200, "documentation:\n  title: Setup\n".as_bytes()),
        ])
        .await;
        let source = source(&server);

        assert_eq!(
            source.fetch_structured("flow.json").await.unwrap(),
            json!({ "start": "a", "steps": {} })
        );
        assert_eq!(
            source.fetch_structured("docs/manifest.yaml").await.unwrap(),
            json!({ "documentation": { "title": "Setup" } })
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.method == "GET"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = TestServer::start(&[("/template.jexl", 500, "boom".as_bytes())]).await;
        let source = source(&server);

        let err = source.fetch_text("template.jexl").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));

        let err = source.fetch_text("missing.md").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, ref path } if path == "missing.md"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpSource::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
        let err = source.fetch_text("flow.json").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
