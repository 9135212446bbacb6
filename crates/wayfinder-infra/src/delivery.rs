//! Submits the derived config payload over HTTP.

use std::time::Duration;

use wayfinder_core::ports::DeliveryClient;
use wayfinder_types::error::DeliveryError;
use wayfinder_types::payload::ConfigPayload;

/// POSTs the payload body as JSON to the payload's `url` and returns the
/// response bytes (the generated artifact).
pub struct HttpDelivery {
    client: reqwest::Client,
}

impl HttpDelivery {
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wayfinder/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeliveryError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl DeliveryClient for HttpDelivery {
    async fn deliver(&self, payload: &ConfigPayload) -> Result<Vec<u8>, DeliveryError> {
        let transport = |e: reqwest::Error| DeliveryError::Transport {
            url: payload.url.clone(),
            message: e.to_string(),
        };

        tracing::info!(url = %payload.url, "Submitting configuration");
        let response = self
            .client
            .post(&payload.url)
            .json(&payload.body)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: payload.url.clone(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        tracing::debug!(bytes = bytes.len(), "Received artifact");
        Ok(bytes.to_vec())
    }
}
