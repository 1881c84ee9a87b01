//! CLI command implementations

pub mod config;
pub mod domain;
pub mod provision;
pub mod resolve;

use anyhow::{Context, Result};
use hostplane_core::PlatformSettings;
use hostplane_upstream::{ApiClient, ReqwestTransport};

/// API client for the configured provider endpoint
pub fn api_client(settings: &PlatformSettings) -> Result<ApiClient> {
    let transport =
        ReqwestTransport::from_settings(settings).context("Failed to build the API client")?;
    Ok(ApiClient::from_transport(transport))
}
