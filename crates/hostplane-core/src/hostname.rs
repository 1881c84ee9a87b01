//! Hostname normalization and DNS validation rules

use crate::{CoreError, Result};

const MAX_LABEL_LEN: usize = 63;
const MAX_HOSTNAME_LEN: usize = 253;

/// Normalize a request host for matching.
///
/// Lower-cases, trims whitespace, strips a `:port` suffix and any trailing dots.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Validate a single DNS label as used for tenant subdomains.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(CoreError::label(label, "must not be empty"));
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(CoreError::label(label, "must be at most 63 characters"));
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(CoreError::label(
            label,
            "only lowercase letters, digits and hyphens are allowed",
        ));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(CoreError::label(label, "must not start or end with a hyphen"));
    }
    Ok(())
}

/// Normalize and validate a tenant-supplied fully qualified hostname.
///
/// Returns the normalized form on success.
pub fn validate_hostname(hostname: &str) -> Result<String> {
    let normalized = normalize_host(hostname);
    if normalized.is_empty() {
        return Err(CoreError::hostname(hostname, "must not be empty"));
    }
    if normalized.len() > MAX_HOSTNAME_LEN {
        return Err(CoreError::hostname(hostname, "must be at most 253 characters"));
    }

    let labels: Vec<&str> = normalized.split('.').collect();
    if labels.len() < 2 {
        return Err(CoreError::hostname(hostname, "must contain at least two labels"));
    }
    for label in &labels {
        validate_label(label).map_err(|e| CoreError::hostname(hostname, e.to_string()))?;
    }

    Ok(normalized)
}
