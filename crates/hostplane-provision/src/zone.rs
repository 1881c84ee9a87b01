//! Zone auto-detection for a custom root domain

use hostplane_core::normalize_host;
use hostplane_upstream::{ApiClient, Zone};
use tracing::{debug, info, warn};

/// Candidate zone names for `domain`, most specific first.
///
/// `a.b.c.com` yields `a.b.c.com`, `b.c.com`, `c.com`. Bare TLDs are never tried.
pub fn candidate_zones(domain: &str) -> Vec<String> {
    let domain = normalize_host(domain);
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return Vec::new();
    }
    (0..labels.len() - 1)
        .map(|start| labels[start..].join("."))
        .collect()
}

/// Find the account zone owning `domain`, stopping at the first match.
///
/// Lookup failures are logged and treated as "no match" for that candidate.
pub async fn detect_zone(api: &ApiClient, domain: &str, account_id: &str) -> Option<Zone> {
    for candidate in candidate_zones(domain) {
        debug!(%candidate, "Looking up zone");
        match api.find_zones(&candidate, account_id).await {
            Ok(zones) => {
                if let Some(zone) = zones.into_iter().next() {
                    info!(zone = %zone.name, zone_id = %zone.id, "Detected zone");
                    return Some(zone);
                }
            }
            Err(e) => warn!(%candidate, error = %e, "Zone lookup failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        assert_eq!(candidate_zones("a.b.c.com"), vec!["a.b.c.com", "b.c.com", "c.com"]);
        assert_eq!(candidate_zones("example.com"), vec!["example.com"]);
        assert_eq!(candidate_zones("Sub.Example.com."), vec!["sub.example.com", "example.com"]);
        assert!(candidate_zones("localhost").is_empty());
        assert!(candidate_zones("").is_empty());
    }
}
