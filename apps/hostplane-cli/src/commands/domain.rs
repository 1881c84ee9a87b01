//! Custom hostname commands

use anyhow::{bail, Result};
use colored::Colorize;
use hostplane_core::{validate_hostname, PlatformSettings};
use hostplane_domains::{
    dns_instructions, CustomHostnameController, CustomHostnameRecord, DeleteOutcome, DnsInstruction,
};
use serde::Serialize;

use crate::commands::api_client;
use crate::output::{self, OutputFormat};
use crate::DomainCommands;

#[derive(Debug, Serialize)]
struct AddOutput {
    hostname: String,
    record: CustomHostnameRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns: Option<DnsInstruction>,
}

#[derive(Debug, Serialize)]
struct RemoveOutput {
    hostname: String,
    outcome: &'static str,
}

pub async fn run(
    settings: &PlatformSettings,
    cmd: &DomainCommands,
    format: OutputFormat,
) -> Result<()> {
    let controller = CustomHostnameController::new(api_client(settings)?, settings.zone_id.clone());

    match cmd {
        DomainCommands::Add { hostname } => add(settings, &controller, hostname, format).await,
        DomainCommands::Status { hostname } => status(&controller, hostname, format).await,
        DomainCommands::Remove { hostname } => remove(&controller, hostname, format).await,
    }
}

/// Reject hostnames the platform already serves itself
fn check_hostname(settings: &PlatformSettings, hostname: &str) -> Result<String> {
    let hostname = validate_hostname(hostname)?;
    if let Some(root) = &settings.root_domain {
        if hostname == *root || hostname.ends_with(&format!(".{root}")) {
            bail!("{hostname} is under the platform root domain {root}");
        }
    }
    Ok(hostname)
}

async fn add(
    settings: &PlatformSettings,
    controller: &CustomHostnameController,
    hostname: &str,
    format: OutputFormat,
) -> Result<()> {
    let hostname = check_hostname(settings, hostname)?;

    if !controller.create(&hostname).await {
        bail!("Could not create custom hostname {hostname}; see the log for details");
    }

    let result = AddOutput {
        record: controller.get_status(&hostname).await,
        dns: settings
            .fallback_origin
            .as_deref()
            .map(|origin| dns_instructions(&hostname, origin)),
        hostname,
    };
    if output::emit(&result, format)? {
        return Ok(());
    }

    output::success(&format!("Requested {}", result.hostname));
    render_record(&result.record);
    match &result.dns {
        Some(dns) => {
            output::section("DNS");
            println!("  {} {} → {}", dns.kind, dns.name, dns.target);
        }
        None => output::warning("No fallback origin configured; cannot suggest a DNS record"),
    }
    Ok(())
}

async fn status(
    controller: &CustomHostnameController,
    hostname: &str,
    format: OutputFormat,
) -> Result<()> {
    let hostname = validate_hostname(hostname)?;
    let record = controller.get_status(&hostname).await;
    if output::emit(&record, format)? {
        return Ok(());
    }
    render_record(&record);
    Ok(())
}

async fn remove(
    controller: &CustomHostnameController,
    hostname: &str,
    format: OutputFormat,
) -> Result<()> {
    let hostname = validate_hostname(hostname)?;
    let outcome = controller.delete_detailed(&hostname).await;

    let label = match &outcome {
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::NothingToDelete => "nothing_to_delete",
        DeleteOutcome::Failed(reason) => bail!("Could not remove {hostname}: {reason}"),
    };
    let result = RemoveOutput {
        hostname,
        outcome: label,
    };
    if output::emit(&result, format)? {
        return Ok(());
    }

    match outcome {
        DeleteOutcome::Deleted => output::success(&format!("Removed {}", result.hostname)),
        _ => output::warning(&format!("{} was not registered upstream", result.hostname)),
    }
    Ok(())
}

fn render_record(record: &CustomHostnameRecord) {
    output::key_value("Hostname", &record.hostname);
    println!("{}: {}", "Status".bold(), output::status_label(record.status));

    if let Some(ssl) = &record.ssl {
        output::key_value("Certificate", &ssl.status);
        if let Some(method) = &ssl.validation_method {
            output::key_value("Validation", method);
        }
        if !ssl.validation_records.is_empty() {
            output::section("Validation records");
            for rec in &ssl.validation_records {
                println!("  {} {} {}", rec.kind, rec.name, rec.value);
            }
        }
        for error in &ssl.validation_errors {
            output::warning(error);
        }
    }

    for error in &record.verification_errors {
        output::warning(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_platform_hostnames() {
        let settings = PlatformSettings {
            root_domain: Some("platform.com".to_string()),
            ..PlatformSettings::default()
        };

        assert!(check_hostname(&settings, "acme.platform.com").is_err());
        assert!(check_hostname(&settings, "platform.com").is_err());
        assert!(check_hostname(&settings, "not a host").is_err());
        assert_eq!(
            check_hostname(&settings, "Shop.Example.org").unwrap(),
            "shop.example.org"
        );
    }
}
