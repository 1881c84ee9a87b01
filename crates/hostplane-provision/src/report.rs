//! Reconciliation state and the operator-facing report

use hostplane_core::mask_secret;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    VerifyCredential,
    AccessProbe,
    DispatchNamespace,
    AccessCredential,
    Routes,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::VerifyCredential => "verify credential",
            Self::AccessProbe => "access probe",
            Self::DispatchNamespace => "dispatch namespace",
            Self::AccessCredential => "access credential",
            Self::Routes => "routes",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Verified,
    Created,
    AlreadyPresent,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    pub outcome: StepOutcome,
    pub detail: String,
}

impl StepRecord {
    pub fn new(step: Step, outcome: StepOutcome, detail: impl Into<String>) -> Self {
        Self {
            step,
            outcome,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountState {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceState {
    pub name: String,
    pub id: String,
    pub existed: bool,
}

/// The credential the platform should use from now on
#[derive(Debug, Clone)]
pub struct CredentialState {
    pub value: SecretString,
    pub created_new: bool,
    /// Minting failed and the original credential is used instead
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    Created,
    AlreadyPresent,
    /// The pattern is bound to another script and was left untouched
    Conflict { script: Option<String> },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSetState {
    pub domain_pattern: String,
    pub wildcard_pattern: String,
    pub zone_id: String,
    pub created: bool,
    pub domain_route: RouteOutcome,
    pub wildcard_route: RouteOutcome,
}

/// Everything a reconciliation run resolved
#[derive(Debug, Clone)]
pub struct ProvisioningState {
    pub account: AccountState,
    pub wfp_available: bool,
    pub dispatch_namespace: Option<NamespaceState>,
    pub access_credential: CredentialState,
    pub route_set: Option<RouteSetState>,
    pub steps: Vec<StepRecord>,
}

impl ProvisioningState {
    pub fn report(&self) -> ProvisioningReport {
        ProvisioningReport {
            account: self.account.clone(),
            wfp_available: self.wfp_available,
            dispatch_namespace: self.dispatch_namespace.clone(),
            access_credential: CredentialReport {
                masked_value: mask_secret(self.access_credential.value.expose_secret()),
                created_new: self.access_credential.created_new,
                degraded: self.access_credential.degraded,
            },
            route_set: self.route_set.clone(),
            steps: self.steps.clone(),
        }
    }

    /// True when any step failed and a capability is missing
    pub fn is_degraded(&self) -> bool {
        self.steps.iter().any(|s| s.outcome == StepOutcome::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialReport {
    pub masked_value: String,
    pub created_new: bool,
    pub degraded: bool,
}

/// Serializable report with the credential masked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub account: AccountState,
    pub wfp_available: bool,
    pub dispatch_namespace: Option<NamespaceState>,
    pub access_credential: CredentialReport,
    pub route_set: Option<RouteSetState>,
    pub steps: Vec<StepRecord>,
}

impl ProvisioningReport {
    pub fn steps_with(&self, outcome: StepOutcome) -> impl Iterator<Item = &StepRecord> {
        self.steps.iter().filter(move |s| s.outcome == outcome)
    }
}
