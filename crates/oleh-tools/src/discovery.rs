//! Search backend over the Discovery Engine REST API.
//!
//! Endpoint: `POST {endpoint}/{serving_config}:search`
//! Authenticated with an OAuth bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use oleh_core::config::SearchConfig;

use crate::error::ToolError;
use crate::search::{SearchBackend, SearchRequest, SearchResponse};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Discovery Engine search client.
pub struct DiscoveryEngineBackend {
    client: Client,
    endpoint: String,
    serving_config: String,
    access_token: String,
}

impl DiscoveryEngineBackend {
    pub fn new(
        endpoint: impl Into<String>,
        serving_config: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            serving_config: serving_config.into(),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(config: &SearchConfig, access_token: impl Into<String>) -> Self {
        Self::new(
            config.endpoint.clone(),
            config.serving_config_path(),
            access_token,
        )
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}:search",
            self.endpoint.trim_end_matches('/'),
            self.serving_config
        )
    }
}

/// Pull the message out of an API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .map(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl SearchBackend for DiscoveryEngineBackend {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ToolError> {
        let url = self.search_url();
        debug!(url = %url, query = %request.query, "Sending search request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ToolError::Backend {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
