//! Tenant records as consumed from the registry

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a custom hostname as observed upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostnameStatus {
    /// Upstream accepted the hostname and is validating it
    Pending,
    /// Validated and routable
    Active,
    /// Upstream reported a failure, or the upstream could not be queried
    Error,
    /// No upstream record exists yet
    NotFound,
}

impl HostnameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Error => "error",
            Self::NotFound => "not_found",
        }
    }

    /// Map an upstream status string onto the closed status model.
    pub fn from_upstream(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "initializing" | "moved" | "test_pending" => Self::Pending,
            s if s.starts_with("pending") => Self::Pending,
            _ => Self::Error,
        }
    }
}

impl std::fmt::Display for HostnameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Opaque, immutable tenant ID
    pub id: String,
    /// Subdomain label, unique across tenants
    pub subdomain_label: String,
    /// Connected custom hostname, unique when present
    pub custom_hostname: Option<String>,
    /// Last observed status of the custom hostname
    pub custom_hostname_status: Option<HostnameStatus>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant addressed by `subdomain_label`
    pub fn new(subdomain_label: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            subdomain_label: subdomain_label.to_ascii_lowercase(),
            custom_hostname: None,
            custom_hostname_status: None,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn with_custom_hostname(mut self, hostname: &str) -> Self {
        self.custom_hostname = Some(hostname.to_ascii_lowercase());
        self
    }

    /// Hostname this tenant is reachable at under the platform root domain
    pub fn platform_hostname(&self, root_domain: &str) -> String {
        format!("{}.{}", self.subdomain_label, root_domain)
    }

    /// Bump `modified_at`, never moving it backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.modified_at = if now > self.modified_at {
            now
        } else {
            self.modified_at + Duration::microseconds(1)
        };
    }

    /// Attach a custom hostname and reset its observed status to pending
    pub fn connect_hostname(&mut self, hostname: &str) {
        self.custom_hostname = Some(hostname.to_ascii_lowercase());
        self.custom_hostname_status = Some(HostnameStatus::Pending);
        self.touch();
    }

    /// Record a polled status. Returns `true` when the stored status changed.
    pub fn record_status(&mut self, status: HostnameStatus) -> bool {
        if self.custom_hostname_status == Some(status) {
            return false;
        }
        self.custom_hostname_status = Some(status);
        self.touch();
        true
    }

    pub fn disconnect_hostname(&mut self) {
        self.custom_hostname = None;
        self.custom_hostname_status = None;
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(HostnameStatus::from_upstream("active"), HostnameStatus::Active);
        assert_eq!(HostnameStatus::from_upstream("pending"), HostnameStatus::Pending);
        assert_eq!(
            HostnameStatus::from_upstream("pending_validation"),
            HostnameStatus::Pending
        );
        assert_eq!(HostnameStatus::from_upstream("moved"), HostnameStatus::Pending);
        assert_eq!(HostnameStatus::from_upstream("blocked"), HostnameStatus::Error);
        assert_eq!(HostnameStatus::from_upstream("deleted"), HostnameStatus::Error);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&HostnameStatus::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut tenant = Tenant::new("acme");
        let future = Utc::now() + Duration::hours(1);
        tenant.modified_at = future;
        tenant.touch();
        assert!(tenant.modified_at > future);
    }

    #[test]
    fn test_record_status_only_touches_on_change() {
        let mut tenant = Tenant::new("acme");
        tenant.connect_hostname("Shop.Example.org");
        assert_eq!(tenant.custom_hostname.as_deref(), Some("shop.example.org"));

        let before = tenant.modified_at;
        assert!(!tenant.record_status(HostnameStatus::Pending));
        assert_eq!(tenant.modified_at, before);

        assert!(tenant.record_status(HostnameStatus::Active));
        assert!(tenant.modified_at > before);
    }

    #[test]
    fn test_platform_hostname() {
        let tenant = Tenant::new("Acme");
        assert_eq!(tenant.platform_hostname("platform.com"), "acme.platform.com");
    }
}
