//! Upstream provider API client
//!
//! Everything that talks to the provider API goes through this crate:
//! - [`AuthResolver`] picks the credential headers (bearer token first, key+email second)
//! - [`UpstreamTransport`] is the injectable HTTP seam, [`ReqwestTransport`] the real one
//! - [`ApiClient`] decodes the `{ success, result, errors }` envelope and exposes typed endpoints

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod models;
pub mod transport;

pub use auth::{AuthResolver, AuthScheme, Credentials};
pub use client::ApiClient;
pub use models::*;
pub use transport::{RawResponse, ReqwestTransport, ReqwestTransportBuilder, UpstreamRequest, UpstreamTransport};

use thiserror::Error;

/// Classified upstream failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// No usable credential (or other required input) was configured
    #[error("Upstream API is not configured: {0}")]
    Unconfigured(String),

    /// The request never produced an HTTP response
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The upstream answered with a failure status or `success: false`
    #[error("Upstream rejected request ({status}): {message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    /// A success response whose body could not be decoded
    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn unconfigured(msg: impl Into<String>) -> Self {
        Self::Unconfigured(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the upstream reported the given provider error code
    pub fn has_code(&self, expected: i64) -> bool {
        matches!(self, Self::Rejected { code: Some(code), .. } if *code == expected)
    }

    /// True for 403 responses and for messages about authorization or authentication
    pub fn is_auth_related(&self) -> bool {
        match self {
            Self::Rejected { status, message, .. } => {
                let message = message.to_ascii_lowercase();
                *status == 403
                    || message.contains("authorization")
                    || message.contains("authentication")
            }
            _ => false,
        }
    }

    /// True when the upstream reports the resource already exists
    pub fn is_already_exists(&self, code: i64) -> bool {
        match self {
            Self::Rejected { message, .. } => {
                self.has_code(code) || message.to_ascii_lowercase().contains("already exists")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
