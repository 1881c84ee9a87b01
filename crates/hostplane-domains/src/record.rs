//! Normalized custom hostname status model

use hostplane_core::HostnameStatus;
use hostplane_upstream::{CustomHostnameWire, SslWire, ValidationErrorWire, ValidationRecordWire};
use serde::{Deserialize, Serialize};

pub const API_NOT_CONFIGURED: &str = "API not configured";
pub const NETWORK_ERROR: &str = "Network error";
pub const SETUP_REQUIRED: &str =
    "Custom domains require additional setup. Please contact the platform administrator.";

/// Status of one custom hostname, with every sequence present (possibly empty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomHostnameRecord {
    pub hostname: String,
    pub status: HostnameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<SslStatus>,
    pub verification_errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SslStatus {
    pub status: String,
    pub validation_method: Option<String>,
    pub validation_errors: Vec<String>,
    pub validation_records: Vec<ValidationRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub value: String,
}

impl CustomHostnameRecord {
    pub fn not_found(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            status: HostnameStatus::NotFound,
            ssl: None,
            verification_errors: Vec::new(),
        }
    }

    pub fn error(hostname: &str, message: impl Into<String>) -> Self {
        Self {
            hostname: hostname.to_string(),
            status: HostnameStatus::Error,
            ssl: None,
            verification_errors: vec![message.into()],
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == HostnameStatus::Active
    }
}

impl From<CustomHostnameWire> for CustomHostnameRecord {
    fn from(wire: CustomHostnameWire) -> Self {
        Self {
            hostname: wire.hostname,
            status: wire
                .status
                .as_deref()
                .map(HostnameStatus::from_upstream)
                .unwrap_or(HostnameStatus::Pending),
            ssl: wire.ssl.map(SslStatus::from),
            verification_errors: wire.verification_errors.unwrap_or_default(),
        }
    }
}

impl From<SslWire> for SslStatus {
    fn from(wire: SslWire) -> Self {
        Self {
            status: wire.status.unwrap_or_else(|| "unknown".to_string()),
            validation_method: wire.validation_method.or(wire.method),
            validation_errors: wire
                .validation_errors
                .unwrap_or_default()
                .into_iter()
                .map(ValidationErrorWire::into_message)
                .collect(),
            validation_records: wire
                .validation_records
                .unwrap_or_default()
                .into_iter()
                .filter_map(ValidationRecord::from_wire)
                .collect(),
        }
    }
}

impl ValidationRecord {
    /// Collapse the upstream's per-method record shapes into `{type, name, value}`.
    fn from_wire(wire: ValidationRecordWire) -> Option<Self> {
        let record = |kind: &str, name: String, value: Option<String>| Self {
            kind: kind.to_string(),
            name,
            value: value.unwrap_or_default(),
        };

        if let (Some(kind), Some(name)) = (wire.kind, wire.name) {
            return Some(record(&kind.to_ascii_uppercase(), name, wire.value));
        }
        if let Some(name) = wire.txt_name {
            return Some(record("TXT", name, wire.txt_value));
        }
        if let Some(url) = wire.http_url {
            return Some(record("HTTP", url, wire.http_body));
        }
        if let Some(name) = wire.cname {
            return Some(record("CNAME", name, wire.cname_target));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: serde_json::Value) -> CustomHostnameWire {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_method_fallback() {
        let record = CustomHostnameRecord::from(wire(json!({
            "id": "ch-1",
            "hostname": "shop.example.org",
            "status": "pending",
            "ssl": {"status": "pending_validation", "method": "http"}
        })));

        let ssl = record.ssl.unwrap();
        assert_eq!(ssl.validation_method.as_deref(), Some("http"));
        assert!(ssl.validation_errors.is_empty());
        assert!(ssl.validation_records.is_empty());
    }

    #[test]
    fn test_explicit_method_preferred() {
        let record = CustomHostnameRecord::from(wire(json!({
            "id": "ch-1",
            "hostname": "shop.example.org",
            "status": "active",
            "ssl": {"status": "active", "method": "http", "validation_method": "txt"}
        })));

        assert!(record.is_active());
        assert_eq!(record.ssl.unwrap().validation_method.as_deref(), Some("txt"));
    }

    #[test]
    fn test_absent_arrays_become_empty() {
        let record = CustomHostnameRecord::from(wire(json!({
            "id": "ch-1",
            "hostname": "shop.example.org",
            "status": "pending"
        })));

        assert!(record.ssl.is_none());
        assert!(record.verification_errors.is_empty());

        let serialized = serde_json::to_value(&record).unwrap();
        assert_eq!(serialized["verification_errors"], json!([]));
    }

    #[test]
    fn test_validation_records_normalized() {
        let record = CustomHostnameRecord::from(wire(json!({
            "id": "ch-1",
            "hostname": "shop.example.org",
            "status": "pending",
            "verification_errors": ["custom hostname does not CNAME to this zone."],
            "ssl": {
                "status": "pending_validation",
                "validation_method": "http",
                "validation_errors": [{"message": "HTTP validation failed"}],
                "validation_records": [
                    {"http_url": "http://shop.example.org/.well-known/acme-challenge/x", "http_body": "token"},
                    {"txt_name": "_acme-challenge.shop.example.org", "txt_value": "abc"},
                    {"status": "pending"}
                ]
            }
        })));

        assert_eq!(
            record.verification_errors,
            vec!["custom hostname does not CNAME to this zone."]
        );
        let ssl = record.ssl.unwrap();
        assert_eq!(ssl.validation_errors, vec!["HTTP validation failed"]);
        assert_eq!(
            ssl.validation_records,
            vec![
                ValidationRecord {
                    kind: "HTTP".to_string(),
                    name: "http://shop.example.org/.well-known/acme-challenge/x".to_string(),
                    value: "token".to_string(),
                },
                ValidationRecord {
                    kind: "TXT".to_string(),
                    name: "_acme-challenge.shop.example.org".to_string(),
                    value: "abc".to_string(),
                },
            ]
        );
    }
}
