//! HTTP client for the backend's active-key listing

use crate::error::{DashboardError, Result};
use async_trait::async_trait;
use keymon_core::{ActiveKeysResponse, BackendSettings};
use reqwest::Client;
use tracing::{debug, instrument};

/// Backend path listing the currently active keys
pub const ACTIVE_KEYS_PATH: &str = "/keys/active";

/// Header carrying the configured API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Anything the panel can ask for the current list of active keys
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetch the active keys, in the order the source reports them
    async fn active_keys(&self) -> Result<Vec<String>>;
}

/// API client for the backend serving `/keys/active`
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    settings: BackendSettings,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL or
    /// the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> Result<Self> {
        let parsed = reqwest::Url::parse(&settings.base_url).map_err(|e| {
            DashboardError::configuration(format!("Invalid base URL {}: {e}", settings.base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DashboardError::configuration(format!(
                "Unsupported scheme in base URL: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| DashboardError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, settings })
    }

    /// Settings this client was built from
    #[must_use]
    pub const fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Issue a GET against a backend path, injecting the API key if configured
    async fn get(&self, path: &str) -> Result<(String, reqwest::Response)> {
        let url = self.settings.url(path);

        let mut request = self.client.get(&url);

        if let Some(ref api_key) = self.settings.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DashboardError::request(url.clone(), e))?;

        if !response.status().is_success() {
            return Err(DashboardError::status(url, response.status().as_u16()));
        }

        Ok((url, response))
    }
}

#[async_trait]
impl KeySource for BackendClient {
    #[instrument(skip(self), fields(base_url = %self.settings.base_url))]
    async fn active_keys(&self) -> Result<Vec<String>> {
        let (url, response) = self.get(ACTIVE_KEYS_PATH).await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| DashboardError::request(url.clone(), e))?;

        let parsed: ActiveKeysResponse = serde_json::from_slice(&body)
            .map_err(|e| DashboardError::decode(url, e.to_string()))?;

        debug!(count = parsed.keys.len(), "Fetched active keys");
        Ok(parsed.keys)
    }
}
