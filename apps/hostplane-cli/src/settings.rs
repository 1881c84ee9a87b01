//! Settings assembly for the CLI

use anyhow::{Context, Result};
use hostplane_core::{resolve_settings, PlatformSettings, SettingsInput};
use tracing::debug;

use crate::Cli;

/// Flags given on the command line, as the highest-precedence layer
pub fn explicit_layer(cli: &Cli) -> SettingsInput {
    SettingsInput {
        account_id: cli.account_id.clone(),
        api_token: cli.api_token.clone(),
        root_domain: cli.root_domain.clone(),
        zone_id: cli.zone_id.clone(),
        api_base_url: cli.api_base_url.clone(),
        ..Default::default()
    }
}

pub fn load(cli: &Cli) -> Result<PlatformSettings> {
    let persisted = SettingsInput::load(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings from the environment".to_string(),
    })?;

    let settings = resolve_settings(
        explicit_layer(cli),
        persisted,
        SettingsInput::from_process_env(),
    );
    debug!(
        config = ?cli.config,
        account_id = ?settings.account_id,
        root_domain = ?settings.root_domain,
        has_credentials = settings.has_credentials(),
        "Settings resolved"
    );
    Ok(settings)
}
