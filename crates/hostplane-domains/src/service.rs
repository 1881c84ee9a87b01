//! Tenant-facing custom domain operations

use hostplane_core::{validate_hostname, Tenant};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::controller::{CustomHostnameController, DeleteOutcome};
use crate::record::CustomHostnameRecord;
use crate::registry::TenantRegistry;
use crate::{DomainError, RegistryError, Result};

/// DNS record a tenant must create to point a custom hostname at the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsInstruction {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub target: String,
}

pub fn dns_instructions(hostname: &str, fallback_origin: &str) -> DnsInstruction {
    DnsInstruction {
        kind: "CNAME".to_string(),
        name: hostname.to_string(),
        target: fallback_origin.to_string(),
    }
}

/// Connects, refreshes and disconnects tenants' custom hostnames
#[derive(Clone)]
pub struct DomainService {
    registry: Arc<dyn TenantRegistry>,
    controller: CustomHostnameController,
    root_domain: Option<String>,
}

impl DomainService {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        controller: CustomHostnameController,
        root_domain: Option<String>,
    ) -> Self {
        Self {
            registry,
            controller,
            root_domain,
        }
    }

    async fn tenant(&self, tenant_id: &str) -> Result<Tenant> {
        self.registry
            .get(tenant_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(tenant_id.to_string()).into())
    }

    /// Validate `hostname`, request it upstream and attach it to the tenant as pending.
    ///
    /// A hostname the tenant already had is removed upstream first. If the registry
    /// rejects the update, the new upstream record is removed again.
    #[instrument(skip(self))]
    pub async fn connect(&self, tenant_id: &str, hostname: &str) -> Result<Tenant> {
        let hostname = validate_hostname(hostname)?;

        if let Some(root) = &self.root_domain {
            if hostname == *root || hostname.ends_with(&format!(".{root}")) {
                return Err(DomainError::ReservedHostname(hostname));
            }
        }

        let mut tenant = self.tenant(tenant_id).await?;
        if let Some(owner) = self.registry.find_by_hostname(&hostname).await? {
            if owner.id != tenant.id {
                return Err(RegistryError::HostnameTaken(hostname).into());
            }
        }

        match tenant.custom_hostname.clone() {
            Some(current) if current == hostname => return Ok(tenant),
            // the old upstream record would otherwise keep pointing at the platform
            Some(previous) => match self.controller.delete_detailed(&previous).await {
                DeleteOutcome::Deleted | DeleteOutcome::NothingToDelete => {
                    info!(tenant = %tenant.id, %previous, "Replaced custom hostname removed upstream");
                }
                DeleteOutcome::Failed(reason) => {
                    return Err(DomainError::DeleteFailed {
                        hostname: previous,
                        reason,
                    });
                }
            },
            None => {}
        }

        if !self.controller.create(&hostname).await {
            return Err(DomainError::CreateFailed(hostname));
        }

        tenant.connect_hostname(&hostname);
        match self.registry.update(tenant).await {
            Ok(tenant) => {
                info!(tenant = %tenant.id, %hostname, "Custom hostname connected");
                Ok(tenant)
            }
            Err(e) => {
                warn!(%hostname, error = %e, "Could not persist custom hostname, removing it upstream");
                if let DeleteOutcome::Failed(reason) = self.controller.delete_detailed(&hostname).await {
                    warn!(%hostname, %reason, "Rollback of custom hostname failed");
                }
                Err(e.into())
            }
        }
    }

    /// Poll upstream and persist the observed status onto the tenant.
    #[instrument(skip(self))]
    pub async fn refresh(&self, tenant_id: &str) -> Result<(Tenant, CustomHostnameRecord)> {
        let mut tenant = self.tenant(tenant_id).await?;
        let hostname = tenant
            .custom_hostname
            .clone()
            .ok_or_else(|| DomainError::NoCustomHostname(tenant_id.to_string()))?;

        let record = self.controller.get_status(&hostname).await;
        if tenant.record_status(record.status) {
            tenant = self.registry.update(tenant).await?;
            info!(tenant = %tenant.id, %hostname, status = %record.status, "Custom hostname status changed");
        }

        Ok((tenant, record))
    }

    /// Remove the tenant's custom hostname upstream and detach it from the record.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, tenant_id: &str) -> Result<Tenant> {
        let mut tenant = self.tenant(tenant_id).await?;
        let hostname = tenant
            .custom_hostname
            .clone()
            .ok_or_else(|| DomainError::NoCustomHostname(tenant_id.to_string()))?;

        match self.controller.delete_detailed(&hostname).await {
            DeleteOutcome::Deleted => {}
            DeleteOutcome::NothingToDelete => {
                warn!(tenant = %tenant.id, %hostname, "No upstream record; detaching anyway");
            }
            DeleteOutcome::Failed(reason) => {
                return Err(DomainError::DeleteFailed { hostname, reason });
            }
        }

        tenant.disconnect_hostname();
        Ok(self.registry.update(tenant).await?)
    }

    /// Current status without touching the registry
    pub async fn status(&self, hostname: &str) -> CustomHostnameRecord {
        self.controller.get_status(hostname).await
    }
}
