//! Provision command

use anyhow::{Context, Result};
use colored::Colorize;
use hostplane_core::{normalize_host, PlatformSettings};
use hostplane_provision::{
    ProvisionError, ProvisioningReport, Reconciler, ReconcilerConfig, RouteOutcome, StepOutcome,
};
use hostplane_upstream::Credentials;
use secrecy::ExposeSecret;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::commands::api_client;
use crate::output::{self, OutputFormat};

/// Command-line overrides for a provisioning run
#[derive(Debug, Default)]
pub struct ProvisionArgs {
    pub domain: Option<String>,
    pub zone_id: Option<String>,
    pub namespace: Option<String>,
}

pub fn apply_overrides(mut settings: PlatformSettings, args: ProvisionArgs) -> PlatformSettings {
    if let Some(domain) = args.domain.filter(|d| !d.trim().is_empty()) {
        settings.root_domain = Some(normalize_host(&domain));
    }
    if let Some(zone_id) = args.zone_id.filter(|z| !z.trim().is_empty()) {
        settings.zone_id = Some(zone_id);
    }
    if let Some(namespace) = args.namespace.filter(|n| !n.trim().is_empty()) {
        settings.dispatch_namespace = namespace;
    }
    settings
}

pub async fn run(
    settings: PlatformSettings,
    args: ProvisionArgs,
    credential_out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let settings = apply_overrides(settings, args);
    let mut config = ReconcilerConfig::from_settings(&settings)?;
    // a minted secret is shown once; without a file it would be lost
    config.may_mint = credential_out.is_some();
    let reconciler = Reconciler::new(
        api_client(&settings)?,
        Credentials::from_settings(&settings),
        config,
    );

    let state = match reconciler.run().await {
        Ok(state) => state,
        Err(e) => {
            if let ProvisionError::Fatal { hints, .. } = &e {
                for hint in hints {
                    eprintln!("  {} {}", "→".yellow(), hint);
                }
            }
            return Err(e.into());
        }
    };

    if state.access_credential.created_new {
        if let Some(path) = credential_out {
            write_secret(path, state.access_credential.value.expose_secret())
                .with_context(|| format!("Failed to write credential to {}", path.display()))?;
        }
    }

    let report = state.report();
    if output::emit(&report, format)? {
        return Ok(());
    }
    render(&report, credential_out);
    Ok(())
}

/// Write `value` to `path`, readable by the owner only on unix.
fn write_secret(path: &Path, value: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);

    let mut file = options.open(path)?;
    // mode only applies on create; tighten files that already existed
    #[cfg(unix)]
    file.set_permissions(<std::fs::Permissions as std::os::unix::fs::PermissionsExt>::from_mode(0o600))?;
    file.write_all(value.as_bytes())
}

fn render(report: &ProvisioningReport, credential_out: Option<&Path>) {
    output::section("Steps");
    for step in &report.steps {
        let icon = match step.outcome {
            StepOutcome::Verified | StepOutcome::AlreadyPresent => "✓".green(),
            StepOutcome::Created => "+".green(),
            StepOutcome::Skipped => "-".dimmed(),
            StepOutcome::Failed => "✗".red(),
        };
        println!("  {} {}: {}", icon, step.step, step.detail);
    }

    output::section("Account");
    let name = report.account.name.as_deref().unwrap_or("(unknown)");
    output::key_value("Account", &format!("{} ({})", name, report.account.id));
    output::key_value(
        "Workers for Platforms",
        if report.wfp_available { "available" } else { "unavailable" },
    );

    if let Some(namespace) = &report.dispatch_namespace {
        let state = if namespace.existed { "existing" } else { "created" };
        output::key_value(
            "Dispatch namespace",
            &format!("{} ({}, {})", namespace.name, namespace.id, state),
        );
    }

    let credential = &report.access_credential;
    output::key_value("Credential", &credential.masked_value);
    if let (true, Some(path)) = (credential.created_new, credential_out) {
        output::success(&format!("New credential written to {}", path.display()));
    }
    if credential.degraded {
        match credential_out {
            Some(_) => output::warning("Could not mint a scoped credential; the current one stays in use"),
            None => output::warning(
                "The current credential cannot manage dispatch namespaces; rerun with --credential-out to mint one",
            ),
        }
    }

    if let Some(routes) = &report.route_set {
        output::section("Routes");
        output::key_value("Zone", &routes.zone_id);
        for (pattern, outcome) in [
            (&routes.domain_pattern, &routes.domain_route),
            (&routes.wildcard_pattern, &routes.wildcard_route),
        ] {
            let text = match outcome {
                RouteOutcome::Created => "created".green().to_string(),
                RouteOutcome::AlreadyPresent => "present".green().to_string(),
                RouteOutcome::Conflict { script } => format!(
                    "{} to {}",
                    "bound".yellow(),
                    script.as_deref().unwrap_or("another script")
                ),
                RouteOutcome::Failed { reason } => format!("{}: {}", "failed".red(), reason),
            };
            println!("  {} {}", pattern, text);
        }
    }

    println!();
    if report.steps_with(StepOutcome::Failed).next().is_some() {
        output::warning("Provisioning finished with degraded steps");
    } else {
        output::success("Provisioning complete");
    }
}
