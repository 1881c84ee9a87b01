//! Hostname resolution and custom hostname lifecycle
//!
//! - [`HostnameClassifier`] maps request hosts to platform routes, tenant subdomains or
//!   custom hostnames and resolves them through a [`TenantRegistry`]
//! - [`CustomHostnameController`] creates, polls and deletes custom hostnames upstream
//! - [`DomainService`] ties the two together and persists status onto tenant records

pub mod classifier;
pub mod controller;
pub mod record;
pub mod registry;
pub mod router;
pub mod service;

pub use classifier::{HostClass, HostnameClassifier, Resolution};
pub use controller::{CustomHostnameController, DeleteOutcome};
pub use record::{CustomHostnameRecord, SslStatus, ValidationRecord};
pub use registry::{InMemoryRegistry, TenantRegistry};
pub use router::{HostRouter, InitState};
pub use service::{dns_instructions, DnsInstruction, DomainService};

use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Subdomain label already taken: {0}")]
    LabelTaken(String),

    #[error("Custom hostname already taken: {0}")]
    HostnameTaken(String),

    #[error("Invalid tenant record: {0}")]
    Invalid(String),

    #[error("Custom hostname lies under the platform root domain: {0}")]
    ReservedHostname(String),

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by [`DomainService`]
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Invalid(#[from] hostplane_core::CoreError),

    #[error("Hostname {0} belongs to the platform root domain")]
    ReservedHostname(String),

    #[error("Tenant {0} has no custom hostname")]
    NoCustomHostname(String),

    #[error("Upstream did not accept custom hostname {0}")]
    CreateFailed(String),

    #[error("Failed to remove custom hostname {hostname}: {reason}")]
    DeleteFailed { hostname: String, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
