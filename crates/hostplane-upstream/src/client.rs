//! Envelope-decoding API client

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::models::Envelope;
use crate::transport::{RawResponse, UpstreamRequest, UpstreamTransport};
use crate::{Result, UpstreamError};

/// Client for the provider API. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn UpstreamTransport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn UpstreamTransport>) -> Self {
        Self { transport }
    }

    pub fn from_transport<T: UpstreamTransport + 'static>(transport: T) -> Self {
        Self::new(Arc::new(transport))
    }

    /// Execute a request and return the decoded `result`, which may be absent.
    pub async fn send<T: DeserializeOwned>(&self, request: UpstreamRequest) -> Result<Option<T>> {
        let raw = self.transport.execute(request).await?;
        decode(raw)
    }

    /// Execute a request whose `result` must be present.
    pub async fn fetch<T: DeserializeOwned>(&self, request: UpstreamRequest) -> Result<T> {
        self.send(request)
            .await?
            .ok_or_else(|| UpstreamError::Decode("response has no result".to_string()))
    }

    /// Execute a request where only the HTTP status matters. Any 2xx succeeds,
    /// whatever the body holds; failures are classified like `send`.
    pub async fn acknowledge(&self, request: UpstreamRequest) -> Result<()> {
        let raw = self.transport.execute(request).await?;
        acknowledge(raw)
    }

    /// Execute a listing request; an absent `result` is an empty list.
    pub async fn list<T: DeserializeOwned>(&self, request: UpstreamRequest) -> Result<Vec<T>> {
        Ok(self.send::<Vec<T>>(request).await?.unwrap_or_default())
    }
}

pub(crate) fn acknowledge(raw: RawResponse) -> Result<()> {
    if raw.is_success() {
        return Ok(());
    }
    decode::<serde_json::Value>(raw).map(|_| ())
}

/// Decode an envelope, classifying failures.
pub(crate) fn decode<T: DeserializeOwned>(raw: RawResponse) -> Result<Option<T>> {
    let envelope = serde_json::from_slice::<Envelope<serde_json::Value>>(&raw.body);

    match envelope {
        Ok(envelope) if raw.is_success() && envelope.success => envelope
            .result
            .filter(|value| !value.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| UpstreamError::Decode(e.to_string())),
        Ok(envelope) => {
            debug!(status = raw.status, errors = ?envelope.errors, "Upstream reported failure");
            Err(UpstreamError::Rejected {
                status: raw.status,
                code: envelope.first_code(),
                message: envelope
                    .error_message()
                    .unwrap_or_else(|| format!("HTTP {}", raw.status)),
            })
        }
        Err(e) if raw.is_success() => Err(UpstreamError::Decode(e.to_string())),
        Err(_) => Err(UpstreamError::Rejected {
            status: raw.status,
            code: None,
            message: format!("HTTP {}", raw.status),
        }),
    }
}
