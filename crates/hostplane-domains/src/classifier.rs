//! Request hostname classification

use hostplane_core::{normalize_host, Tenant};
use serde::Serialize;

use crate::registry::TenantRegistry;
use crate::RegistryError;

/// How a request host relates to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HostClass {
    /// The apex or a reserved platform route
    Platform,
    /// `{label}.{root}`
    TenantSubdomain(String),
    /// Anything else, matched against tenants' custom hostnames
    CustomHostname(String),
}

/// Outcome of resolving a request host against the registry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    Platform,
    Tenant { class: HostClass, tenant: Tenant },
    Unresolved { class: HostClass },
}

impl Resolution {
    pub fn tenant(&self) -> Option<&Tenant> {
        match self {
            Self::Tenant { tenant, .. } => Some(tenant),
            _ => None,
        }
    }
}

/// Classifies request hosts relative to a platform root domain
#[derive(Debug, Clone)]
pub struct HostnameClassifier {
    root_domain: String,
    reserved: Vec<String>,
}

impl HostnameClassifier {
    pub fn new(root_domain: &str, reserved_labels: &[String]) -> Self {
        let root_domain = normalize_host(root_domain);
        let mut reserved = vec![root_domain.clone()];
        reserved.extend(
            reserved_labels
                .iter()
                .map(|label| format!("{}.{}", label.to_ascii_lowercase(), root_domain)),
        );
        Self {
            root_domain,
            reserved,
        }
    }

    pub fn root_domain(&self) -> &str {
        &self.root_domain
    }

    /// Classify without consulting the registry.
    pub fn classify(&self, request_host: &str) -> HostClass {
        let host = normalize_host(request_host);

        if self.reserved.iter().any(|r| *r == host) {
            return HostClass::Platform;
        }

        if let Some(label) = host
            .strip_suffix(self.root_domain.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
        {
            if !label.is_empty() && !label.contains('.') {
                return HostClass::TenantSubdomain(label.to_string());
            }
        }

        HostClass::CustomHostname(host)
    }

    /// Classify and look the tenant up in `registry`.
    pub async fn resolve(
        &self,
        request_host: &str,
        registry: &dyn TenantRegistry,
    ) -> Result<Resolution, RegistryError> {
        let class = self.classify(request_host);

        let tenant = match &class {
            HostClass::Platform => return Ok(Resolution::Platform),
            HostClass::TenantSubdomain(label) => registry.find_by_label(label).await?,
            HostClass::CustomHostname(hostname) => registry.find_by_hostname(hostname).await?,
        };

        Ok(match tenant {
            Some(tenant) => Resolution::Tenant { class, tenant },
            None => Resolution::Unresolved { class },
        })
    }
}
