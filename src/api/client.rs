//! HTTP transport for the paginated endpoints.

use crate::config::ApiConfig;
use crate::{CollectorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Status and undecoded body of one upstream response.
///
/// Classification (success shape, rate limit, auth failure) happens in the
/// collector, so the transport never interprets the status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One GET against a paginated endpoint.
///
/// `Err` means the request never produced a response (connect failure,
/// timeout, unreadable body).
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<HttpReply>;
}

#[derive(Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_key_header: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, timeout: Duration) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();

        url::Url::parse(&config.base_url)
            .map_err(|e| CollectorError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("tweet-collector/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_header: config.api_key_header.clone(),
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn get(&self, endpoint: &str, params: &[(String, String)]) -> Result<HttpReply> {
        let url = self.endpoint_url(endpoint);
        debug!(url = %url, ?params, "GET");

        let response = self
            .client
            .get(&url)
            .header(self.api_key_header.as_str(), self.api_key.as_str())
            .query(params)
            .send()
            .await
            .map_err(|e| CollectorError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CollectorError::Request(format!("failed to read body: {}", e)))?;

        Ok(HttpReply { status, body })
    }
}
