//! HTTP transport seam
//!
//! [`UpstreamTransport`] is the single point where requests leave the process.
//! It is injected into [`crate::ApiClient`] so tests can point it at a mock server
//! or replace it entirely.

use async_trait::async_trait;
use hostplane_core::PlatformSettings;
use reqwest::{header, Client, Method};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::{AuthResolver, Credentials};
use crate::{Result, UpstreamError};

/// An outbound request, relative to the transport's base URL
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes requests against the provider API with credentials attached.
///
/// Implementations return `Transport` when no response arrived and
/// `Unconfigured` when no credential is available. Any HTTP status,
/// including failures, is returned as a [`RawResponse`].
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn execute(&self, request: UpstreamRequest) -> Result<RawResponse>;
}

/// Transport backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Builder for [`ReqwestTransport`]
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    base_url: Option<String>,
    credentials: Credentials,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| hostplane_core::settings::DEFAULT_API_BASE_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| UpstreamError::unconfigured(format!("invalid API base URL: {e}")))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(30));
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("hostplane/{}", env!("CARGO_PKG_VERSION")));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| UpstreamError::transport(e.to_string()))?;

        Ok(ReqwestTransport {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: self.credentials,
        })
    }
}

impl ReqwestTransport {
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Transport configured from resolved platform settings
    pub fn from_settings(settings: &PlatformSettings) -> Result<Self> {
        Self::builder()
            .base_url(settings.api_base_url.clone())
            .credentials(Credentials::from_settings(settings))
            .timeout(settings.timeout)
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same HTTP client and base URL with different credentials
    pub fn with_credentials(&self, credentials: Credentials) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            credentials,
        }
    }

    fn url(&self, request: &UpstreamRequest) -> Result<Url> {
        // base paths like `/client/v4` must survive, so concatenate instead of `Url::join`
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|e| UpstreamError::unconfigured(format!("invalid request URL: {e}")))?;

        if !request.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl UpstreamTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: UpstreamRequest) -> Result<RawResponse> {
        let auth = AuthResolver::headers(&self.credentials)?;
        let url = self.url(&request)?;

        let mut req = self.http.request(request.method.clone(), url).headers(auth);
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string()))?;
        let status = response.status().as_u16();

        // always drain the body so the connection can be reused
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::transport(e.to_string()))?
            .to_vec();

        debug!(status, bytes = body.len(), "Upstream responded");
        Ok(RawResponse { status, body })
    }
}
