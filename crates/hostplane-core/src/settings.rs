//! Platform settings and their layered resolution
//!
//! Settings come from three layers, highest precedence first:
//! 1. explicit values (CLI flags, programmatic overrides)
//! 2. persisted values (settings file plus `HOSTPLANE__*` environment overrides)
//! 3. environment defaults (`CLOUDFLARE_*` and friends)
//!
//! [`resolve_settings`] merges them per field with no interactive step.

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::hostname::normalize_host;
use crate::Result;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_DISPATCH_NAMESPACE: &str = "tenants";
pub const DEFAULT_PLATFORM_SCRIPT: &str = "platform";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RESERVED_LABELS: &[&str] = &["build", "admin", "www", "api"];

/// One layer of unresolved settings. Every field is optional.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsInput {
    pub account_id: Option<String>,
    pub api_token: Option<String>,
    pub api_key: Option<String>,
    pub api_email: Option<String>,
    pub root_domain: Option<String>,
    pub zone_id: Option<String>,
    pub fallback_origin: Option<String>,
    pub dispatch_namespace: Option<String>,
    pub platform_script: Option<String>,
    pub api_base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub reserved_labels: Option<Vec<String>>,
}

impl std::fmt::Debug for SettingsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsInput")
            .field("account_id", &self.account_id)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_email", &self.api_email)
            .field("root_domain", &self.root_domain)
            .field("zone_id", &self.zone_id)
            .field("fallback_origin", &self.fallback_origin)
            .field("dispatch_namespace", &self.dispatch_namespace)
            .field("platform_script", &self.platform_script)
            .field("api_base_url", &self.api_base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("reserved_labels", &self.reserved_labels)
            .finish()
    }
}

impl SettingsInput {
    /// Load the persisted layer from an optional settings file with
    /// `HOSTPLANE__*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("HOSTPLANE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reserved_labels"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Build the environment-default layer through a variable lookup.
    pub fn from_env_defaults<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            account_id: lookup("CLOUDFLARE_ACCOUNT_ID"),
            api_token: lookup("CLOUDFLARE_API_TOKEN"),
            api_key: lookup("CLOUDFLARE_API_KEY"),
            api_email: lookup("CLOUDFLARE_EMAIL"),
            root_domain: lookup("CUSTOM_DOMAIN"),
            zone_id: lookup("CLOUDFLARE_ZONE_ID"),
            fallback_origin: lookup("FALLBACK_ORIGIN"),
            dispatch_namespace: lookup("DISPATCH_NAMESPACE"),
            ..Default::default()
        }
    }

    /// Environment-default layer read from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_env_defaults(|key| std::env::var(key).ok())
    }
}

/// Fully resolved platform settings
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub account_id: Option<String>,
    pub api_token: Option<SecretString>,
    pub api_key: Option<SecretString>,
    pub api_email: Option<String>,
    /// Platform root domain, normalized
    pub root_domain: Option<String>,
    pub zone_id: Option<String>,
    /// CNAME target advertised to tenants for their custom hostnames
    pub fallback_origin: Option<String>,
    pub dispatch_namespace: String,
    /// The platform's own deployable unit, targeted by the routing rules
    pub platform_script: String,
    pub api_base_url: String,
    pub timeout: Duration,
    pub reserved_labels: Vec<String>,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        resolve_settings(
            SettingsInput::default(),
            SettingsInput::default(),
            SettingsInput::default(),
        )
    }
}

impl PlatformSettings {
    /// True when some usable credential is present
    pub fn has_credentials(&self) -> bool {
        self.api_token.is_some() || (self.api_key.is_some() && self.api_email.is_some())
    }

    /// Printable view with secrets masked
    pub fn view(&self) -> SettingsView {
        SettingsView {
            account_id: self.account_id.clone(),
            api_token: self.api_token.as_ref().map(|s| mask_secret(s.expose_secret())),
            api_key: self.api_key.as_ref().map(|s| mask_secret(s.expose_secret())),
            api_email: self.api_email.clone(),
            root_domain: self.root_domain.clone(),
            zone_id: self.zone_id.clone(),
            fallback_origin: self.fallback_origin.clone(),
            dispatch_namespace: self.dispatch_namespace.clone(),
            platform_script: self.platform_script.clone(),
            api_base_url: self.api_base_url.clone(),
            timeout_seconds: self.timeout.as_secs(),
            reserved_labels: self.reserved_labels.clone(),
        }
    }
}

/// Serializable settings with secrets masked
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub account_id: Option<String>,
    pub api_token: Option<String>,
    pub api_key: Option<String>,
    pub api_email: Option<String>,
    pub root_domain: Option<String>,
    pub zone_id: Option<String>,
    pub fallback_origin: Option<String>,
    pub dispatch_namespace: String,
    pub platform_script: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    pub reserved_labels: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pick(explicit: Option<String>, persisted: Option<String>, env: Option<String>) -> Option<String> {
    non_blank(explicit)
        .or_else(|| non_blank(persisted))
        .or_else(|| non_blank(env))
}

/// Merge the three settings layers, per field, highest precedence first.
pub fn resolve_settings(
    explicit: SettingsInput,
    persisted: SettingsInput,
    env: SettingsInput,
) -> PlatformSettings {
    let reserved_labels = explicit
        .reserved_labels
        .or(persisted.reserved_labels)
        .or(env.reserved_labels)
        .map(|labels| {
            labels
                .into_iter()
                .map(|l| l.trim().to_ascii_lowercase())
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_else(|| DEFAULT_RESERVED_LABELS.iter().map(|l| l.to_string()).collect());

    let timeout_seconds = explicit
        .timeout_seconds
        .or(persisted.timeout_seconds)
        .or(env.timeout_seconds)
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

    PlatformSettings {
        account_id: pick(explicit.account_id, persisted.account_id, env.account_id),
        api_token: pick(explicit.api_token, persisted.api_token, env.api_token)
            .map(SecretString::new),
        api_key: pick(explicit.api_key, persisted.api_key, env.api_key).map(SecretString::new),
        api_email: pick(explicit.api_email, persisted.api_email, env.api_email),
        root_domain: pick(explicit.root_domain, persisted.root_domain, env.root_domain)
            .map(|d| normalize_host(&d))
            .filter(|d| !d.is_empty()),
        zone_id: pick(explicit.zone_id, persisted.zone_id, env.zone_id),
        fallback_origin: pick(
            explicit.fallback_origin,
            persisted.fallback_origin,
            env.fallback_origin,
        )
        .map(|d| normalize_host(&d)),
        dispatch_namespace: pick(
            explicit.dispatch_namespace,
            persisted.dispatch_namespace,
            env.dispatch_namespace,
        )
        .unwrap_or_else(|| DEFAULT_DISPATCH_NAMESPACE.to_string()),
        platform_script: pick(
            explicit.platform_script,
            persisted.platform_script,
            env.platform_script,
        )
        .unwrap_or_else(|| DEFAULT_PLATFORM_SCRIPT.to_string()),
        api_base_url: pick(explicit.api_base_url, persisted.api_base_url, env.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        timeout: Duration::from_secs(timeout_seconds),
        reserved_labels,
    }
}

/// Mask a secret for display, keeping only a short prefix and suffix.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(8);
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}…{suffix}")
}
