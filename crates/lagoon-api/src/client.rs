//! HTTP client for the platform REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use crate::error::ApiError;
use crate::types::{
    ApiResponse, CreateDataAssetRequest, PermissionsRequest, RunCapsuleRequest, SearchQuery,
    UpdateDataAssetRequest,
};

/// Surface the jobs layer consumes. Implemented by [`HttpPlatformClient`]
/// and by scripted fakes in tests.
///
/// Every method returns the remote status and body verbatim; interpreting
/// a 404 as "missing" or a 500 as "broken" belongs to the caller.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn create_data_asset(
        &self,
        request: &CreateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError>;

    async fn get_data_asset(&self, id: &str) -> Result<ApiResponse, ApiError>;

    async fn update_data_asset(
        &self,
        id: &str,
        request: &UpdateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError>;

    async fn update_permissions(
        &self,
        id: &str,
        request: &PermissionsRequest,
    ) -> Result<ApiResponse, ApiError>;

    async fn search_data_assets(&self, query: &SearchQuery) -> Result<ApiResponse, ApiError>;

    async fn run_capsule(&self, request: &RunCapsuleRequest) -> Result<ApiResponse, ApiError>;

    async fn get_computation(&self, id: &str) -> Result<ApiResponse, ApiError>;
}

/// Connection settings for the platform.
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    /// Deployment root, e.g. `https://lagoon.acme.org`.
    pub domain: String,
    /// API token minted in the platform's account settings.
    pub token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl PlatformConfig {
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }

    /// Read `LAGOON_DOMAIN` and `LAGOON_API_TOKEN` from the environment.
    pub fn from_env() -> Option<Self> {
        let domain = std::env::var("LAGOON_DOMAIN").ok()?;
        let token = std::env::var("LAGOON_API_TOKEN").ok()?;
        Some(Self::new(domain, token))
    }
}

/// Reqwest-backed [`PlatformApi`] implementation.
#[derive(Clone)]
pub struct HttpPlatformClient {
    client: reqwest::Client,
    config: PlatformConfig,
}

impl std::fmt::Debug for HttpPlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlatformClient")
            .field("domain", &self.config.domain)
            .finish()
    }
}

impl HttpPlatformClient {
    pub fn new(config: PlatformConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|error| ApiError::Configuration(format!("invalid api token: {error}")))?;
        headers.insert(AUTHORIZATION, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ApiError::Configuration(format!("failed to build http client: {error}"))
            })?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{}",
            self.config.domain.trim_end_matches('/'),
            path
        )
    }

    async fn execute(
        &self,
        endpoint: String,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse, ApiError> {
        let response = request.send().await.map_err(|error| ApiError::Transport {
            endpoint: endpoint.clone(),
            source: error,
        })?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|error| ApiError::Body {
            endpoint: endpoint.clone(),
            source: error,
        })?;
        // Some endpoints answer 204 with an empty body; others may return
        // plain text on errors. Both still need to reach the caller.
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        tracing::debug!(%endpoint, status, "platform api response");
        Ok(ApiResponse { status, body })
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn create_data_asset(
        &self,
        request: &CreateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint("data_assets");
        let builder = self.client.post(&endpoint).json(request);
        self.execute(endpoint, builder).await
    }

    async fn get_data_asset(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint(&format!("data_assets/{id}"));
        let builder = self.client.get(&endpoint);
        self.execute(endpoint, builder).await
    }

    async fn update_data_asset(
        &self,
        id: &str,
        request: &UpdateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint(&format!("data_assets/{id}"));
        let builder = self.client.put(&endpoint).json(request);
        self.execute(endpoint, builder).await
    }

    async fn update_permissions(
        &self,
        id: &str,
        request: &PermissionsRequest,
    ) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint(&format!("data_assets/{id}/permissions"));
        let builder = self.client.post(&endpoint).json(request);
        self.execute(endpoint, builder).await
    }

    async fn search_data_assets(&self, query: &SearchQuery) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint("data_assets");
        let builder = self.client.get(&endpoint).query(query);
        self.execute(endpoint, builder).await
    }

    async fn run_capsule(&self, request: &RunCapsuleRequest) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint("computations");
        let builder = self.client.post(&endpoint).json(request);
        self.execute(endpoint, builder).await
    }

    async fn get_computation(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let endpoint = self.endpoint(&format!("computations/{id}"));
        let builder = self.client.get(&endpoint);
        self.execute(endpoint, builder).await
    }
}
