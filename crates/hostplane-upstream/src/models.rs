//! Wire models for the provider API
//!
//! These mirror the upstream JSON shapes. Normalization into Hostplane's own
//! models happens in the consuming crates, right after deserialization.

use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

impl<T> Envelope<T> {
    /// All error messages joined, if any
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn first_code(&self) -> Option<i64> {
        self.errors.first().map(|e| e.code)
    }
}

/// Error or informational message inside an envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Result of the credential verification endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenVerification {
    pub id: String,
    pub status: String,
}

impl TokenVerification {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchNamespace {
    pub namespace_id: String,
    pub namespace_name: String,
    #[serde(default)]
    pub script_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTokenRequest {
    pub name: String,
    pub policies: Vec<TokenPolicy>,
    pub expires_on: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPolicy {
    pub effect: String,
    pub resources: std::collections::BTreeMap<String, String>,
    pub permission_groups: Vec<PermissionGroupRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PermissionGroupRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A freshly minted credential. `value` is only returned once by the upstream.
#[derive(Clone, Deserialize)]
pub struct MintedToken {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub expires_on: Option<String>,
}

impl std::fmt::Debug for MintedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MintedToken")
            .field("id", &self.id)
            .field("value", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerRoute {
    pub id: String,
    pub pattern: String,
    #[serde(default)]
    pub script: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRouteRequest {
    pub pattern: String,
    pub script: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCustomHostnameRequest {
    pub hostname: String,
    pub ssl: SslRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SslRequest {
    pub method: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: SslSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SslSettings {
    pub min_tls_version: String,
    pub tls_1_3: String,
}

impl CreateCustomHostnameRequest {
    /// HTTP-01 domain validation, TLS 1.2 minimum, TLS 1.3 enabled
    pub fn http_validated(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ssl: SslRequest {
                method: "http".to_string(),
                kind: "dv".to_string(),
                settings: SslSettings {
                    min_tls_version: "1.2".to_string(),
                    tls_1_3: "on".to_string(),
                },
            },
        }
    }
}

/// Custom hostname as returned by the upstream
#[derive(Debug, Clone, Deserialize)]
pub struct CustomHostnameWire {
    pub id: String,
    pub hostname: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ssl: Option<SslWire>,
    #[serde(default)]
    pub verification_errors: Option<Vec<String>>,
}

/// SSL block. The validation method shows up under either `validation_method` or `method`.
#[derive(Debug, Clone, Deserialize)]
pub struct SslWire {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub validation_method: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub validation_errors: Option<Vec<ValidationErrorWire>>,
    #[serde(default)]
    pub validation_records: Option<Vec<ValidationRecordWire>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ValidationErrorWire {
    Text(String),
    Detail { message: String },
}

impl ValidationErrorWire {
    pub fn into_message(self) -> String {
        match self {
            Self::Text(message) | Self::Detail { message } => message,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationRecordWire {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub txt_name: Option<String>,
    #[serde(default)]
    pub txt_value: Option<String>,
    #[serde(default)]
    pub http_url: Option<String>,
    #[serde(default)]
    pub http_body: Option<String>,
    #[serde(default)]
    pub cname: Option<String>,
    #[serde(default)]
    pub cname_target: Option<String>,
}
