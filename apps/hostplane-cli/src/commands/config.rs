//! Configuration commands

use anyhow::Result;
use hostplane_core::PlatformSettings;

use crate::output::{self, OutputFormat};
use crate::ConfigCommands;

pub fn run(settings: &PlatformSettings, cmd: &ConfigCommands, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(settings, format),
    }
}

fn show(settings: &PlatformSettings, format: OutputFormat) -> Result<()> {
    let view = settings.view();
    if output::emit(&view, format)? {
        return Ok(());
    }

    let unset = || "(not set)".to_string();
    output::section("Upstream");
    output::key_value("api_base_url", &view.api_base_url);
    output::key_value("account_id", &view.account_id.clone().unwrap_or_else(unset));
    output::key_value("api_token", &view.api_token.clone().unwrap_or_else(unset));
    output::key_value("api_key", &view.api_key.clone().unwrap_or_else(unset));
    output::key_value("api_email", &view.api_email.clone().unwrap_or_else(unset));
    output::key_value("timeout_seconds", &view.timeout_seconds.to_string());

    output::section("Platform");
    output::key_value("root_domain", &view.root_domain.clone().unwrap_or_else(unset));
    output::key_value("zone_id", &view.zone_id.clone().unwrap_or_else(unset));
    output::key_value("fallback_origin", &view.fallback_origin.clone().unwrap_or_else(unset));
    output::key_value("dispatch_namespace", &view.dispatch_namespace);
    output::key_value("platform_script", &view.platform_script);
    output::key_value("reserved_labels", &view.reserved_labels.join(", "));

    if !settings.has_credentials() {
        println!();
        output::warning("No API token or API key and email configured");
    }
    Ok(())
}
