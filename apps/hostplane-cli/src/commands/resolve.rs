//! Host resolution command

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use hostplane_core::{normalize_host, PlatformSettings, Tenant};
use hostplane_domains::{
    HostClass, HostRouter, HostnameClassifier, InMemoryRegistry, InitState, Resolution,
    TenantRegistry,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize)]
struct ResolveOutput {
    host: String,
    root_domain: String,
    #[serde(flatten)]
    resolution: Resolution,
}

/// Build a registry from a JSON array of tenant records.
///
/// Records whose custom hostname sits under `root_domain` are refused.
pub async fn load_tenants(path: &Path, root_domain: &str) -> Result<InMemoryRegistry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tenants from {}", path.display()))?;
    let tenants: Vec<Tenant> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid tenant file {}", path.display()))?;

    let registry = InMemoryRegistry::with_root_domain(root_domain);
    for tenant in tenants {
        registry.insert(tenant).await?;
    }
    Ok(registry)
}

pub async fn run(
    settings: &PlatformSettings,
    host: &str,
    root: Option<&str>,
    tenants: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let root_domain = root
        .map(normalize_host)
        .or_else(|| settings.root_domain.clone())
        .ok_or_else(|| anyhow!("No root domain; pass --root or configure root_domain"))?;

    let registry = match tenants {
        Some(path) => load_tenants(path, &root_domain).await?,
        None => InMemoryRegistry::new(),
    };

    let router = HostRouter::new(
        HostnameClassifier::new(&root_domain, &settings.reserved_labels),
        Arc::new(registry),
        InitState::new(),
    );
    let resolution = router.route(host).await?;

    let result = ResolveOutput {
        host: normalize_host(host),
        root_domain,
        resolution,
    };
    if output::emit(&result, format)? {
        return Ok(());
    }

    output::key_value("Host", &result.host);
    match &result.resolution {
        Resolution::Platform => output::key_value("Route", "platform"),
        Resolution::Tenant { class, tenant } => {
            output::key_value("Route", &describe(class));
            output::key_value("Tenant", &format!("{} ({})", tenant.subdomain_label, tenant.id));
        }
        Resolution::Unresolved { class } => {
            output::key_value("Route", &describe(class));
            println!("{}: {}", "Tenant".bold(), "no match".yellow());
        }
    }
    Ok(())
}

fn describe(class: &HostClass) -> String {
    match class {
        HostClass::Platform => "platform".to_string(),
        HostClass::TenantSubdomain(label) => format!("tenant subdomain '{label}'"),
        HostClass::CustomHostname(hostname) => format!("custom hostname '{hostname}'"),
    }
}
