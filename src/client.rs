//! HTTP access to the National Weather Service API.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::constants::{ACCEPT_GEO_JSON, NWS_API_BASE, REQUEST_TIMEOUT, USER_AGENT};
use crate::error::FetchError;

/// Source of upstream JSON documents.
///
/// A fetch either yields the parsed body or `None`. Callers only branch on
/// presence, so implementations must not panic or surface error detail.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Base URL that endpoint paths are appended to.
    fn base_url(&self) -> &str;

    /// GET `url` and parse the body as JSON.
    async fn fetch(&self, url: &str) -> Option<Value>;
}

/// Fetcher backed by a reqwest client talking to api.weather.gov.
#[derive(Clone)]
pub struct NwsClient {
    client: Arc<Client>,
    base_url: String,
}

impl NwsClient {
    /// Creates a client for the public NWS API.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_base_url(NWS_API_BASE, REQUEST_TIMEOUT)
    }

    /// Creates a client for an arbitrary base URL and timeout.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GEO_JSON));

        // Idle connections are not kept, so every call opens its own.
        // Redirects are reported as non-success rather than followed.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Makes an HTTP GET request and parses the JSON response
    async fn make_request(&self, url: &str) -> Result<Value, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl Fetcher for NwsClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Option<Value> {
        match self.make_request(url).await {
            Ok(value) => {
                debug!("Fetched upstream document");
                Some(value)
            }
            Err(e) => {
                warn!(error = %e, "Upstream request failed");
                None
            }
        }
    }
}
