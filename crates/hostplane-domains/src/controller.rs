//! Custom hostname lifecycle against the upstream API
//!
//! State is never inferred locally. Every status comes from a fresh upstream
//! round trip, and no operation here raises: failures are folded into the
//! returned boolean, [`DeleteOutcome`] or [`CustomHostnameRecord`].

use hostplane_core::normalize_host;
use hostplane_upstream::{ApiClient, CreateCustomHostnameRequest, UpstreamError};
use tracing::{info, instrument, warn};

use crate::record::{CustomHostnameRecord, API_NOT_CONFIGURED, NETWORK_ERROR, SETUP_REQUIRED};

/// Result of a delete, keeping "nothing to delete" apart from failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NothingToDelete,
    Failed(String),
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Drives custom hostnames in one upstream zone
#[derive(Debug, Clone)]
pub struct CustomHostnameController {
    api: ApiClient,
    zone_id: Option<String>,
}

impl CustomHostnameController {
    pub fn new(api: ApiClient, zone_id: Option<String>) -> Self {
        Self {
            api,
            zone_id: zone_id.filter(|z| !z.trim().is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.zone_id.is_some()
    }

    fn zone(&self) -> Result<&str, UpstreamError> {
        self.zone_id
            .as_deref()
            .ok_or_else(|| UpstreamError::unconfigured("no zone id configured"))
    }

    /// Request a custom hostname with HTTP-01 validation. `true` only on upstream success.
    #[instrument(skip(self))]
    pub async fn create(&self, hostname: &str) -> bool {
        let hostname = normalize_host(hostname);
        let zone = match self.zone() {
            Ok(zone) => zone,
            Err(e) => {
                warn!(%hostname, error = %e, "Cannot create custom hostname");
                return false;
            }
        };

        let request = CreateCustomHostnameRequest::http_validated(hostname.clone());
        match self.api.create_custom_hostname(zone, &request).await {
            Ok(()) => {
                info!(%hostname, "Custom hostname created");
                true
            }
            Err(e) => {
                warn!(%hostname, error = %e, "Custom hostname creation failed");
                false
            }
        }
    }

    /// Query the upstream for the current status of `hostname`.
    #[instrument(skip(self))]
    pub async fn get_status(&self, hostname: &str) -> CustomHostnameRecord {
        let hostname = normalize_host(hostname);
        let zone = match self.zone() {
            Ok(zone) => zone,
            Err(_) => return CustomHostnameRecord::error(&hostname, API_NOT_CONFIGURED),
        };

        match self.api.list_custom_hostnames(zone, &hostname).await {
            // duplicates are an upstream inconsistency; the first record is authoritative
            Ok(records) => match records.into_iter().next() {
                Some(record) => CustomHostnameRecord::from(record),
                None => CustomHostnameRecord::not_found(&hostname),
            },
            Err(e) => status_for_error(&hostname, e),
        }
    }

    /// Delete `hostname`, returning `true` only when an upstream record was removed.
    pub async fn delete(&self, hostname: &str) -> bool {
        self.delete_detailed(hostname).await.is_deleted()
    }

    /// Look up the upstream id for `hostname`, then delete by id.
    #[instrument(skip(self))]
    pub async fn delete_detailed(&self, hostname: &str) -> DeleteOutcome {
        let hostname = normalize_host(hostname);
        let zone = match self.zone() {
            Ok(zone) => zone,
            Err(e) => return DeleteOutcome::Failed(e.to_string()),
        };

        let records = match self.api.list_custom_hostnames(zone, &hostname).await {
            Ok(records) => records,
            Err(e) => {
                warn!(%hostname, error = %e, "Custom hostname lookup failed");
                return DeleteOutcome::Failed(e.to_string());
            }
        };

        let Some(record) = records.into_iter().next() else {
            info!(%hostname, "No upstream custom hostname to delete");
            return DeleteOutcome::NothingToDelete;
        };

        match self.api.delete_custom_hostname(zone, &record.id).await {
            Ok(()) => {
                info!(%hostname, id = %record.id, "Custom hostname deleted");
                DeleteOutcome::Deleted
            }
            Err(e) => {
                warn!(%hostname, id = %record.id, error = %e, "Custom hostname delete failed");
                DeleteOutcome::Failed(e.to_string())
            }
        }
    }
}

fn status_for_error(hostname: &str, error: UpstreamError) -> CustomHostnameRecord {
    match error {
        UpstreamError::Unconfigured(_) => CustomHostnameRecord::error(hostname, API_NOT_CONFIGURED),
        UpstreamError::Transport(ref detail) => {
            warn!(%hostname, error = %detail, "Custom hostname status request failed");
            CustomHostnameRecord::error(hostname, NETWORK_ERROR)
        }
        ref e if e.is_auth_related() => {
            // raw upstream text may describe account internals
            warn!(%hostname, error = %e, "Custom hostname API rejected credentials");
            CustomHostnameRecord::error(hostname, SETUP_REQUIRED)
        }
        UpstreamError::Rejected { message, .. } => CustomHostnameRecord::error(hostname, message),
        UpstreamError::Decode(message) => CustomHostnameRecord::error(hostname, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostplane_core::HostnameStatus;

    #[test]
    fn test_error_mapping() {
        let record = status_for_error("foo.com", UpstreamError::unconfigured("no token"));
        assert_eq!(record.verification_errors, vec![API_NOT_CONFIGURED]);

        let record = status_for_error("foo.com", UpstreamError::transport("connection reset"));
        assert_eq!(record.verification_errors, vec![NETWORK_ERROR]);

        let record = status_for_error(
            "foo.com",
            UpstreamError::Rejected {
                status: 400,
                code: Some(10000),
                message: "Authentication error".to_string(),
            },
        );
        assert_eq!(record.verification_errors, vec![SETUP_REQUIRED]);

        let record = status_for_error(
            "foo.com",
            UpstreamError::Rejected {
                status: 400,
                code: Some(1409),
                message: "Invalid hostname".to_string(),
            },
        );
        assert_eq!(record.status, HostnameStatus::Error);
        assert_eq!(record.verification_errors, vec!["Invalid hostname"]);
    }

    #[test]
    fn test_delete_outcome() {
        assert!(DeleteOutcome::Deleted.is_deleted());
        assert!(!DeleteOutcome::NothingToDelete.is_deleted());
        assert!(!DeleteOutcome::Failed("boom".to_string()).is_deleted());
    }
}
