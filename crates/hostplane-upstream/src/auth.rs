//! Credential selection for outbound calls

use hostplane_core::PlatformSettings;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::{Result, UpstreamError};

const X_AUTH_KEY: &str = "x-auth-key";
const X_AUTH_EMAIL: &str = "x-auth-email";

/// Credential material available to the client
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_token: Option<SecretString>,
    pub api_key: Option<SecretString>,
    pub api_email: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_email", &self.api_email)
            .finish()
    }
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(SecretString::new(token.into())),
            ..Default::default()
        }
    }

    pub fn key_and_email(key: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::new(key.into())),
            api_email: Some(email.into()),
            ..Default::default()
        }
    }

    pub fn from_settings(settings: &PlatformSettings) -> Self {
        Self {
            api_token: settings.api_token.clone(),
            api_key: settings.api_key.clone(),
            api_email: settings.api_email.clone(),
        }
    }

    /// The scheme these credentials resolve to, if any
    pub fn scheme(&self) -> Option<AuthScheme> {
        AuthResolver::scheme(self)
    }
}

/// Which credential form is attached to requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    KeyEmail,
}

/// Formats credentials into request headers
pub struct AuthResolver;

impl AuthResolver {
    /// Pick the scheme: a bearer token wins over a key+email pair.
    pub fn scheme(credentials: &Credentials) -> Option<AuthScheme> {
        let present = |s: &Option<SecretString>| {
            s.as_ref()
                .map(|v| !v.expose_secret().trim().is_empty())
                .unwrap_or(false)
        };

        if present(&credentials.api_token) {
            return Some(AuthScheme::Bearer);
        }

        let has_email = credentials
            .api_email
            .as_ref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false);
        if present(&credentials.api_key) && has_email {
            return Some(AuthScheme::KeyEmail);
        }

        None
    }

    /// Build the header set, or `Unconfigured` when no usable credential exists.
    pub fn headers(credentials: &Credentials) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        match Self::scheme(credentials) {
            Some(AuthScheme::Bearer) => {
                let token = credentials
                    .api_token
                    .as_ref()
                    .map(|t| t.expose_secret().trim().to_string())
                    .unwrap_or_default();
                headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
            }
            Some(AuthScheme::KeyEmail) => {
                let key = credentials
                    .api_key
                    .as_ref()
                    .map(|k| k.expose_secret().trim().to_string())
                    .unwrap_or_default();
                let email = credentials.api_email.as_deref().unwrap_or_default().trim();
                headers.insert(HeaderName::from_static(X_AUTH_KEY), sensitive(&key)?);
                headers.insert(HeaderName::from_static(X_AUTH_EMAIL), sensitive(email)?);
            }
            None => {
                return Err(UpstreamError::unconfigured(
                    "no API token or key+email pair configured",
                ))
            }
        }

        Ok(headers)
    }
}

fn sensitive(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| UpstreamError::unconfigured("credential contains invalid header characters"))?;
    header.set_sensitive(true);
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_takes_precedence() {
        let credentials = Credentials {
            api_token: Some(SecretString::new("token-123".to_string())),
            api_key: Some(SecretString::new("key-456".to_string())),
            api_email: Some("ops@example.com".to_string()),
        };

        let headers = AuthResolver::headers(&credentials).unwrap();
        assert_eq!(credentials.scheme(), Some(AuthScheme::Bearer));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer token-123");
        assert!(headers.get(X_AUTH_KEY).is_none());
    }

    #[test]
    fn test_key_email_pair() {
        let credentials = Credentials::key_and_email("key-456", "ops@example.com");

        let headers = AuthResolver::headers(&credentials).unwrap();
        assert_eq!(headers.get(X_AUTH_KEY).unwrap(), "key-456");
        assert_eq!(headers.get(X_AUTH_EMAIL).unwrap(), "ops@example.com");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_unconfigured() {
        let err = AuthResolver::headers(&Credentials::default()).unwrap_err();
        assert!(matches!(err, UpstreamError::Unconfigured(_)));

        // a key without an email is not a usable pair
        let credentials = Credentials {
            api_key: Some(SecretString::new("key-456".to_string())),
            ..Default::default()
        };
        assert!(AuthResolver::headers(&credentials).is_err());

        assert!(AuthResolver::headers(&Credentials::token("   ")).is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let debug = format!("{:?}", Credentials::token("secret-token"));
        assert!(!debug.contains("secret-token"));
    }
}
