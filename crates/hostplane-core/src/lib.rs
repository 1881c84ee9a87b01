//! Core types for the Hostplane control plane
//!
//! This crate holds the pieces every other Hostplane crate agrees on:
//! - Hostname normalization and DNS label validation
//! - The tenant record shape consumed from the registry
//! - Platform settings and their layered resolution
//! - Secret masking for anything that ends up in a report or log line

pub mod hostname;
pub mod settings;
pub mod tenant;

pub use hostname::{normalize_host, validate_hostname, validate_label};
pub use settings::{mask_secret, resolve_settings, PlatformSettings, SettingsInput, SettingsView};
pub use tenant::{HostnameStatus, Tenant};

use thiserror::Error;

/// Errors raised by core validation and settings loading
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid subdomain label '{label}': {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("Invalid hostname '{hostname}': {reason}")]
    InvalidHostname { hostname: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CoreError {
    pub fn label(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLabel {
            label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn hostname(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHostname {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
