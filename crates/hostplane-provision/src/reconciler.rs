//! The reconciliation procedure

use chrono::Utc;
use hostplane_core::PlatformSettings;
use hostplane_upstream::{ApiClient, AuthScheme, Credentials, DispatchNamespace, UpstreamError, WorkerRoute};
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use crate::credential::dispatch_token_request;
use crate::report::{
    AccountState, CredentialState, NamespaceState, ProvisioningState, RouteOutcome, RouteSetState,
    Step, StepOutcome, StepRecord,
};
use crate::zone::detect_zone;
use crate::{ProvisionError, Result};

/// Provider code for a plan without Workers for Platforms
const NO_PLATFORM_ACCESS: i64 = 10121;
/// Provider code for a generic authentication failure
const AUTHENTICATION_ERROR: i64 = 10000;
/// Provider code for a namespace that already exists
const NAMESPACE_EXISTS: i64 = 10027;

/// Inputs for one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub account_id: String,
    pub namespace: String,
    pub root_domain: Option<String>,
    pub zone_id: Option<String>,
    pub platform_script: String,
    /// Whether a replacement credential may be minted. Callers that cannot
    /// store a minted secret turn this off.
    pub may_mint: bool,
}

impl ReconcilerConfig {
    pub fn from_settings(settings: &PlatformSettings) -> Result<Self> {
        let account_id = settings
            .account_id
            .clone()
            .ok_or_else(|| ProvisionError::Unconfigured("account id is required".to_string()))?;

        Ok(Self {
            account_id,
            namespace: settings.dispatch_namespace.clone(),
            root_domain: settings.root_domain.clone(),
            zone_id: settings.zone_id.clone(),
            platform_script: settings.platform_script.clone(),
            may_mint: true,
        })
    }
}

/// Brings the upstream account to the shape the platform needs.
pub struct Reconciler {
    api: ApiClient,
    credentials: Credentials,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(api: ApiClient, credentials: Credentials, config: ReconcilerConfig) -> Self {
        Self {
            api,
            credentials,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Run every step in order. Only credential verification can fail the run.
    #[instrument(skip(self), fields(account_id = %self.config.account_id, namespace = %self.config.namespace))]
    pub async fn run(&self) -> Result<ProvisioningState> {
        let mut steps = Vec::new();

        let verified_name = self.verify_credential(&mut steps).await?;
        let account = AccountState {
            id: self.config.account_id.clone(),
            name: match verified_name {
                Some(name) => Some(name),
                None => self.lookup_account_name().await,
            },
        };

        // Access probe
        let listing = match self.api.list_namespaces(&self.config.account_id).await {
            Ok(listing) => {
                steps.push(StepRecord::new(
                    Step::AccessProbe,
                    StepOutcome::Verified,
                    "dispatch namespaces are accessible",
                ));
                Some(listing)
            }
            Err(e) => {
                let detail = if is_access_missing(&e) {
                    "Workers for Platforms is not available for this account or credential"
                } else {
                    "could not confirm dispatch namespace access"
                };
                warn!(error = %e, "{detail}");
                steps.push(StepRecord::new(Step::AccessProbe, StepOutcome::Failed, detail));
                None
            }
        };
        let wfp_available = listing.is_some();

        let dispatch_namespace = match listing {
            Some(existing) => match self.ensure_namespace_from(existing).await {
                Ok(state) => {
                    let outcome = if state.existed {
                        StepOutcome::AlreadyPresent
                    } else {
                        StepOutcome::Created
                    };
                    steps.push(StepRecord::new(
                        Step::DispatchNamespace,
                        outcome,
                        format!("{} ({})", state.name, state.id),
                    ));
                    Some(state)
                }
                Err(e) => {
                    warn!(error = %e, namespace = %self.config.namespace, "Failed to ensure dispatch namespace");
                    steps.push(StepRecord::new(
                        Step::DispatchNamespace,
                        StepOutcome::Failed,
                        e.to_string(),
                    ));
                    None
                }
            },
            None => {
                steps.push(StepRecord::new(
                    Step::DispatchNamespace,
                    StepOutcome::Skipped,
                    "namespace access unavailable",
                ));
                None
            }
        };

        let access_credential = self.ensure_credential(wfp_available, &mut steps).await;

        let route_set = self.ensure_routes(wfp_available, &mut steps).await;

        let state = ProvisioningState {
            account,
            wfp_available,
            dispatch_namespace,
            access_credential,
            route_set,
            steps,
        };
        info!(degraded = state.is_degraded(), "Provisioning finished");
        Ok(state)
    }

    /// Check the credential; returns the account name when the check already produced it.
    async fn verify_credential(&self, steps: &mut Vec<StepRecord>) -> Result<Option<String>> {
        match self.credentials.scheme() {
            None => Err(ProvisionError::Unconfigured(
                "an API token, or an API key and email, is required".to_string(),
            )),
            Some(AuthScheme::Bearer) => match self.api.verify_token().await {
                Ok(verification) if verification.is_active() => {
                    steps.push(StepRecord::new(
                        Step::VerifyCredential,
                        StepOutcome::Verified,
                        "API token is active",
                    ));
                    Ok(None)
                }
                Ok(verification) => Err(ProvisionError::fatal(format!(
                    "API token status is '{}'",
                    verification.status
                ))),
                Err(e) => Err(fatal_from(e)),
            },
            Some(AuthScheme::KeyEmail) => match self.api.get_account(&self.config.account_id).await {
                Ok(account) => {
                    steps.push(StepRecord::new(
                        Step::VerifyCredential,
                        StepOutcome::Verified,
                        "API key can read the account",
                    ));
                    Ok(account.name)
                }
                Err(e) => Err(fatal_from(e)),
            },
        }
    }

    async fn lookup_account_name(&self) -> Option<String> {
        match self.api.get_account(&self.config.account_id).await {
            Ok(account) => account.name,
            Err(e) => {
                warn!(error = %e, "Account lookup failed");
                None
            }
        }
    }

    /// Find the configured namespace, creating it when missing.
    pub async fn ensure_namespace(&self) -> hostplane_upstream::Result<NamespaceState> {
        let existing = self.api.list_namespaces(&self.config.account_id).await?;
        self.ensure_namespace_from(existing).await
    }

    async fn ensure_namespace_from(
        &self,
        existing: Vec<DispatchNamespace>,
    ) -> hostplane_upstream::Result<NamespaceState> {
        let name = &self.config.namespace;
        if let Some(found) = find_namespace(existing, name) {
            debug!(%name, "Dispatch namespace already present");
            return Ok(found);
        }

        match self.api.create_namespace(&self.config.account_id, name).await {
            Ok(created) => {
                info!(%name, id = %created.namespace_id, "Created dispatch namespace");
                Ok(NamespaceState {
                    name: created.namespace_name,
                    id: created.namespace_id,
                    existed: false,
                })
            }
            Err(e) if e.is_already_exists(NAMESPACE_EXISTS) => {
                debug!(%name, "Namespace created concurrently, relisting");
                let relisted = self.api.list_namespaces(&self.config.account_id).await?;
                find_namespace(relisted, name).ok_or(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_credential(
        &self,
        proven: bool,
        steps: &mut Vec<StepRecord>,
    ) -> CredentialState {
        let original = self.original_credential();

        if proven {
            steps.push(StepRecord::new(
                Step::AccessCredential,
                StepOutcome::AlreadyPresent,
                "current credential can manage dispatch namespaces",
            ));
            return CredentialState {
                value: original,
                created_new: false,
                degraded: false,
            };
        }

        if !self.config.may_mint {
            warn!("Current credential cannot manage dispatch namespaces and minting is disabled");
            steps.push(StepRecord::new(
                Step::AccessCredential,
                StepOutcome::Failed,
                "no output configured for a minted credential, using the current one",
            ));
            return CredentialState {
                value: original,
                created_new: false,
                degraded: true,
            };
        }

        let request = dispatch_token_request(&self.config.namespace, &self.config.account_id, Utc::now());
        match self.api.create_token(&request).await {
            Ok(minted) => {
                info!(token_id = %minted.id, name = %request.name, "Minted dispatch credential");
                steps.push(StepRecord::new(
                    Step::AccessCredential,
                    StepOutcome::Created,
                    request.name,
                ));
                CredentialState {
                    value: SecretString::new(minted.value),
                    created_new: true,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "Could not mint a dispatch credential, keeping the current one");
                steps.push(StepRecord::new(
                    Step::AccessCredential,
                    StepOutcome::Failed,
                    "minting failed, using the current credential",
                ));
                CredentialState {
                    value: original,
                    created_new: false,
                    degraded: true,
                }
            }
        }
    }

    fn original_credential(&self) -> SecretString {
        self.credentials
            .api_token
            .clone()
            .or_else(|| self.credentials.api_key.clone())
            .unwrap_or_else(|| SecretString::new(String::new()))
    }

    async fn ensure_routes(
        &self,
        wfp_available: bool,
        steps: &mut Vec<StepRecord>,
    ) -> Option<RouteSetState> {
        let Some(domain) = self.config.root_domain.as_deref() else {
            steps.push(StepRecord::new(
                Step::Routes,
                StepOutcome::Skipped,
                "no root domain configured",
            ));
            return None;
        };
        if !wfp_available {
            steps.push(StepRecord::new(
                Step::Routes,
                StepOutcome::Skipped,
                "namespace access unavailable",
            ));
            return None;
        }

        let zone_id = match &self.config.zone_id {
            Some(zone_id) => zone_id.clone(),
            None => match detect_zone(&self.api, domain, &self.config.account_id).await {
                Some(zone) => zone.id,
                None => {
                    warn!(%domain, "No zone found for root domain, routes not ensured");
                    steps.push(StepRecord::new(
                        Step::Routes,
                        StepOutcome::Failed,
                        format!("no zone found for {domain}; pass a zone id"),
                    ));
                    return None;
                }
            },
        };

        let domain_pattern = format!("{domain}/*");
        let wildcard_pattern = format!("*.{domain}/*");

        let existing = match self.api.list_routes(&zone_id).await {
            Ok(routes) => routes,
            Err(e) => {
                warn!(error = %e, %zone_id, "Could not list routes");
                steps.push(StepRecord::new(Step::Routes, StepOutcome::Failed, e.to_string()));
                let failed = RouteOutcome::Failed {
                    reason: e.to_string(),
                };
                return Some(RouteSetState {
                    domain_pattern,
                    wildcard_pattern,
                    zone_id,
                    created: false,
                    domain_route: failed.clone(),
                    wildcard_route: failed,
                });
            }
        };

        let domain_route = self.ensure_route(&zone_id, &existing, &domain_pattern).await;
        let wildcard_route = self.ensure_route(&zone_id, &existing, &wildcard_pattern).await;

        let outcomes = [&domain_route, &wildcard_route];
        let created = outcomes.iter().any(|o| matches!(o, RouteOutcome::Created));
        let (outcome, detail) = if outcomes
            .iter()
            .any(|o| matches!(o, RouteOutcome::Failed { .. } | RouteOutcome::Conflict { .. }))
        {
            (StepOutcome::Failed, "one or more routes could not be ensured")
        } else if created {
            (StepOutcome::Created, "routes bound to the platform script")
        } else {
            (StepOutcome::AlreadyPresent, "routes already bound to the platform script")
        };
        steps.push(StepRecord::new(Step::Routes, outcome, detail));

        Some(RouteSetState {
            domain_pattern,
            wildcard_pattern,
            zone_id,
            created,
            domain_route,
            wildcard_route,
        })
    }

    async fn ensure_route(&self, zone_id: &str, existing: &[WorkerRoute], pattern: &str) -> RouteOutcome {
        let script = &self.config.platform_script;

        if let Some(route) = existing.iter().find(|r| r.pattern == pattern) {
            return if route.script.as_deref() == Some(script.as_str()) {
                RouteOutcome::AlreadyPresent
            } else {
                warn!(%pattern, bound_to = ?route.script, "Route bound to another script, leaving it untouched");
                RouteOutcome::Conflict {
                    script: route.script.clone(),
                }
            };
        }

        match self.api.create_route(zone_id, pattern, script).await {
            Ok(()) => {
                info!(%pattern, %script, "Created route");
                RouteOutcome::Created
            }
            Err(e) => {
                warn!(%pattern, error = %e, "Failed to create route");
                RouteOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn find_namespace(namespaces: Vec<DispatchNamespace>, name: &str) -> Option<NamespaceState> {
    namespaces
        .into_iter()
        .find(|ns| ns.namespace_name == name)
        .map(|ns| NamespaceState {
            name: ns.namespace_name,
            id: ns.namespace_id,
            existed: true,
        })
}

fn is_access_missing(error: &UpstreamError) -> bool {
    error.status() == Some(403)
        || error.has_code(NO_PLATFORM_ACCESS)
        || error.has_code(AUTHENTICATION_ERROR)
}

/// Raw upstream auth errors stay in the log; the operator gets the status only.
fn fatal_from(error: UpstreamError) -> ProvisionError {
    warn!(error = %error, "Credential verification failed");
    match error {
        UpstreamError::Rejected { status, .. } => {
            ProvisionError::fatal(format!("credential rejected by the provider (HTTP {status})"))
        }
        UpstreamError::Transport(msg) => {
            ProvisionError::fatal(format!("could not reach the provider: {msg}"))
        }
        other => ProvisionError::fatal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_requires_account() {
        let settings = PlatformSettings::default();
        assert!(matches!(
            ReconcilerConfig::from_settings(&settings),
            Err(ProvisionError::Unconfigured(_))
        ));

        let settings = PlatformSettings {
            account_id: Some("acct-1".to_string()),
            root_domain: Some("platform.com".to_string()),
            ..PlatformSettings::default()
        };
        let config = ReconcilerConfig::from_settings(&settings).unwrap();
        assert_eq!(config.namespace, "tenants");
        assert_eq!(config.platform_script, "platform");
        assert_eq!(config.root_domain.as_deref(), Some("platform.com"));
    }

    #[test]
    fn test_access_missing_codes() {
        let rejected = |status, code| UpstreamError::Rejected {
            status,
            code,
            message: "nope".to_string(),
        };
        assert!(is_access_missing(&rejected(403, None)));
        assert!(is_access_missing(&rejected(400, Some(10121))));
        assert!(is_access_missing(&rejected(400, Some(10000))));
        assert!(!is_access_missing(&rejected(500, Some(7003))));
        assert!(!is_access_missing(&UpstreamError::transport("reset")));
    }

    #[test]
    fn test_fatal_hides_upstream_message() {
        let err = fatal_from(UpstreamError::Rejected {
            status: 401,
            code: Some(9109),
            message: "Invalid access token abc".to_string(),
        });
        assert!(!err.to_string().contains("abc"));
        assert_eq!(err.hints().len(), 3);
    }
}
