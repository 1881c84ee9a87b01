//! Tenant registry seam
//!
//! The registry is owned outside the core. Hostplane only needs keyed reads,
//! inserts and updates, plus an idempotent setup call.

use async_trait::async_trait;
use hostplane_core::{normalize_host, validate_hostname, validate_label, Tenant};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::RegistryError;

/// Keyed tenant store
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Prepare the backing store. Safe to call any number of times.
    async fn ensure_schema(&self) -> Result<(), RegistryError>;

    async fn get(&self, id: &str) -> Result<Option<Tenant>, RegistryError>;

    async fn find_by_label(&self, label: &str) -> Result<Option<Tenant>, RegistryError>;

    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Tenant>, RegistryError>;

    /// Insert a new tenant, enforcing label and hostname uniqueness.
    async fn insert(&self, tenant: Tenant) -> Result<Tenant, RegistryError>;

    /// Replace an existing tenant record, enforcing uniqueness.
    async fn update(&self, tenant: Tenant) -> Result<Tenant, RegistryError>;
}

/// In-process registry, mainly for tests and the CLI
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    tenants: RwLock<HashMap<String, Tenant>>,
    schema_runs: AtomicUsize,
    root_domain: Option<String>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses custom hostnames at or below `root`
    pub fn with_root_domain(root: &str) -> Self {
        Self {
            root_domain: Some(normalize_host(root)),
            ..Self::default()
        }
    }

    /// Number of times `ensure_schema` has run
    pub fn schema_runs(&self) -> usize {
        self.schema_runs.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.tenants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.read().is_empty()
    }

    fn validate(&self, tenant: &Tenant) -> Result<Tenant, RegistryError> {
        let mut tenant = tenant.clone();
        tenant.subdomain_label = tenant.subdomain_label.to_ascii_lowercase();
        validate_label(&tenant.subdomain_label)
            .map_err(|e| RegistryError::Invalid(e.to_string()))?;

        if let Some(hostname) = &tenant.custom_hostname {
            let normalized =
                validate_hostname(hostname).map_err(|e| RegistryError::Invalid(e.to_string()))?;
            if let Some(root) = &self.root_domain {
                if normalized == *root || normalized.ends_with(&format!(".{root}")) {
                    return Err(RegistryError::ReservedHostname(normalized));
                }
            }
            tenant.custom_hostname = Some(normalized);
        }
        Ok(tenant)
    }

    fn check_unique(
        tenants: &HashMap<String, Tenant>,
        candidate: &Tenant,
    ) -> Result<(), RegistryError> {
        for other in tenants.values().filter(|t| t.id != candidate.id) {
            if other.subdomain_label == candidate.subdomain_label {
                return Err(RegistryError::LabelTaken(candidate.subdomain_label.clone()));
            }
            if candidate.custom_hostname.is_some()
                && other.custom_hostname == candidate.custom_hostname
            {
                return Err(RegistryError::HostnameTaken(
                    candidate.custom_hostname.clone().unwrap_or_default(),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TenantRegistry for InMemoryRegistry {
    async fn ensure_schema(&self) -> Result<(), RegistryError> {
        let runs = self.schema_runs.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(runs, "In-memory registry ready");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Tenant>, RegistryError> {
        Ok(self.tenants.read().get(id).cloned())
    }

    async fn find_by_label(&self, label: &str) -> Result<Option<Tenant>, RegistryError> {
        let label = label.to_ascii_lowercase();
        Ok(self
            .tenants
            .read()
            .values()
            .find(|t| t.subdomain_label == label)
            .cloned())
    }

    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<Tenant>, RegistryError> {
        let hostname = normalize_host(hostname);
        Ok(self
            .tenants
            .read()
            .values()
            .find(|t| t.custom_hostname.as_deref() == Some(hostname.as_str()))
            .cloned())
    }

    async fn insert(&self, tenant: Tenant) -> Result<Tenant, RegistryError> {
        let tenant = self.validate(&tenant)?;
        let mut tenants = self.tenants.write();
        if tenants.contains_key(&tenant.id) {
            return Err(RegistryError::Invalid(format!(
                "tenant {} already exists",
                tenant.id
            )));
        }
        Self::check_unique(&tenants, &tenant)?;
        tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }

    async fn update(&self, tenant: Tenant) -> Result<Tenant, RegistryError> {
        let tenant = self.validate(&tenant)?;
        let mut tenants = self.tenants.write();
        if !tenants.contains_key(&tenant.id) {
            return Err(RegistryError::NotFound(tenant.id.clone()));
        }
        Self::check_unique(&tenants, &tenant)?;
        tenants.insert(tenant.id.clone(), tenant.clone());
        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let registry = InMemoryRegistry::new();
        let tenant = registry.insert(Tenant::new("acme")).await.unwrap();

        assert_eq!(registry.get(&tenant.id).await.unwrap(), Some(tenant.clone()));
        assert_eq!(registry.find_by_label("ACME").await.unwrap(), Some(tenant));
        assert_eq!(registry.find_by_label("other").await.unwrap(), None);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_label_uniqueness() {
        let registry = InMemoryRegistry::new();
        registry.insert(Tenant::new("acme")).await.unwrap();

        let err = registry.insert(Tenant::new("acme")).await.unwrap_err();
        assert_eq!(err, RegistryError::LabelTaken("acme".to_string()));
    }

    #[tokio::test]
    async fn test_hostname_uniqueness() {
        let registry = InMemoryRegistry::new();
        registry
            .insert(Tenant::new("acme").with_custom_hostname("shop.example.org"))
            .await
            .unwrap();

        let err = registry
            .insert(Tenant::new("globex").with_custom_hostname("Shop.Example.org."))
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::HostnameTaken("shop.example.org".to_string()));
    }

    #[tokio::test]
    async fn test_platform_hostnames_rejected() {
        let registry = InMemoryRegistry::with_root_domain("Platform.com.");

        let err = registry
            .insert(Tenant::new("evil").with_custom_hostname("acme.platform.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::ReservedHostname("acme.platform.com".to_string()));

        let err = registry
            .insert(Tenant::new("evil").with_custom_hostname("platform.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RegistryError::ReservedHostname("platform.com".to_string()));

        let tenant = registry.insert(Tenant::new("evil")).await.unwrap();
        let err = registry
            .update(tenant.clone().with_custom_hostname("shop.platform.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::ReservedHostname(_)));

        // look-alike domains are not under the root
        let stored = registry
            .update(tenant.with_custom_hostname("notplatform.com"))
            .await
            .unwrap();
        assert_eq!(stored.custom_hostname.as_deref(), Some("notplatform.com"));
    }

    #[tokio::test]
    async fn test_invalid_label_rejected() {
        let registry = InMemoryRegistry::new();
        let err = registry.insert(Tenant::new("-bad-")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_update_missing_tenant() {
        let registry = InMemoryRegistry::new();
        let err = registry.update(Tenant::new("acme")).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_repeatable() {
        let registry = InMemoryRegistry::new();
        registry.ensure_schema().await.unwrap();
        registry.ensure_schema().await.unwrap();
        assert_eq!(registry.schema_runs(), 2);
    }
}
