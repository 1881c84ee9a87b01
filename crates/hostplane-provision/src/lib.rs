//! Provisioning reconciler
//!
//! A one-shot, strictly sequential procedure that brings the upstream account
//! to the shape the platform needs: a dispatch namespace, a scoped credential
//! and the routing rules for a custom root domain. Every step checks before it
//! creates, so the whole run can be repeated safely. Only the initial
//! credential check aborts; everything else degrades and is reported.
//!
//! Runs must be serialized by the caller. Two interleaved runs can both mint a
//! credential between probe and mint.

pub mod credential;
pub mod reconciler;
pub mod report;
pub mod zone;

pub use reconciler::{Reconciler, ReconcilerConfig};
pub use report::{
    AccountState, CredentialState, NamespaceState, ProvisioningReport, ProvisioningState,
    RouteOutcome, RouteSetState, Step, StepOutcome, StepRecord,
};
pub use zone::{candidate_zones, detect_zone};

use thiserror::Error;

/// Provisioning errors
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Required input is missing before anything can run
    #[error("Provisioning is not configured: {0}")]
    Unconfigured(String),

    /// Credential verification failed; the run is aborted
    #[error("Credential verification failed: {reason}")]
    Fatal { reason: String, hints: Vec<String> },
}

impl ProvisionError {
    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
            hints: vec![
                "Check that the API token (or key and email) is correct and not expired".to_string(),
                "Check that the account plan includes Workers for Platforms".to_string(),
                "Check that the credential has Account Settings and Workers Scripts permissions"
                    .to_string(),
            ],
        }
    }

    /// Remediation hints for the operator
    pub fn hints(&self) -> &[String] {
        match self {
            Self::Fatal { hints, .. } => hints,
            Self::Unconfigured(_) => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
