//! Scoped dispatch credential

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use hostplane_upstream::{CreateTokenRequest, PermissionGroupRef, TokenPolicy};
use std::collections::BTreeMap;

/// Permission groups granted to the dispatch credential, as `(id, name)`
pub const DISPATCH_PERMISSION_GROUPS: [(&str, &str); 3] = [
    ("c1fde68c7bcc44588cbb6ddbc16d6480", "Account Settings Read"),
    ("e086da7e2179491d91ee5f35b3ca210a", "Workers Scripts Write"),
    ("1a71c399035b4950a1bd1466bbe4f420", "Workers Scripts Read"),
];

pub const CREDENTIAL_LIFETIME_DAYS: i64 = 365;

/// Build the mint request for a credential scoped to one account, expiring a year after `now`.
pub fn dispatch_token_request(
    namespace: &str,
    account_id: &str,
    now: DateTime<Utc>,
) -> CreateTokenRequest {
    let mut resources = BTreeMap::new();
    resources.insert(
        format!("com.cloudflare.api.account.{account_id}"),
        "*".to_string(),
    );

    CreateTokenRequest {
        name: format!("{namespace}-dispatch"),
        policies: vec![TokenPolicy {
            effect: "allow".to_string(),
            resources,
            permission_groups: DISPATCH_PERMISSION_GROUPS
                .iter()
                .map(|(id, name)| PermissionGroupRef {
                    id: id.to_string(),
                    name: Some(name.to_string()),
                })
                .collect(),
        }],
        expires_on: (now + Duration::days(CREDENTIAL_LIFETIME_DAYS))
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}
