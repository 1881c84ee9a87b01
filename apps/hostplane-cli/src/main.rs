//! Hostplane CLI
//!
//! Operator tooling for the Hostplane control plane: provision the upstream
//! account, manage custom hostnames and inspect how request hosts resolve.

mod commands;
mod output;
mod settings;
mod telemetry;

use clap::{Parser, Subcommand};
use colored::Colorize;
use output::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "hostplane",
    author = "Hostplane Team",
    version,
    about = "Hostplane - multi-tenant hostname control plane",
    long_about = "Operator tooling for the Hostplane control plane.\n\n\
                  Provision the upstream account for tenant dispatch, connect and\n\
                  inspect custom hostnames, and check how request hosts resolve."
)]
pub struct Cli {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, env = "HOSTPLANE_CONFIG")]
    config: Option<PathBuf>,

    /// Upstream account id
    #[arg(long)]
    account_id: Option<String>,

    /// Upstream API token
    #[arg(long)]
    api_token: Option<String>,

    /// Platform root domain
    #[arg(long)]
    root_domain: Option<String>,

    /// Zone holding the root domain and custom hostnames
    #[arg(long)]
    zone_id: Option<String>,

    /// Upstream API base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Show error causes
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile the upstream account with what the platform needs
    Provision {
        /// Root domain to route to the platform
        #[arg(short, long)]
        domain: Option<String>,

        /// Zone id, skipping auto-detection
        #[arg(long)]
        zone_id: Option<String>,

        /// Dispatch namespace name
        #[arg(short, long)]
        namespace: Option<String>,

        /// Write a newly minted credential to this file
        #[arg(long)]
        credential_out: Option<PathBuf>,
    },

    /// Manage tenant custom hostnames
    #[command(subcommand)]
    Domain(DomainCommands),

    /// Show how a request host resolves
    Resolve {
        /// Request host, optionally with a port
        host: String,

        /// Platform root domain (defaults to the configured one)
        #[arg(short, long)]
        root: Option<String>,

        /// JSON file with an array of tenant records
        #[arg(short, long)]
        tenants: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum DomainCommands {
    /// Request a custom hostname and print the DNS record to create
    Add {
        /// Custom hostname
        hostname: String,
    },
    /// Show validation and certificate status
    Status {
        /// Custom hostname
        hostname: String,
    },
    /// Remove a custom hostname
    Remove {
        /// Custom hostname
        hostname: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show resolved settings with secrets masked
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = telemetry::init_tracing(&cli.log_level, cli.json_logs) {
        eprintln!("{}: {}", "Warning".yellow().bold(), e);
    }

    let result = match settings::load(&cli) {
        Ok(settings) => match &cli.command {
            Commands::Provision {
                domain,
                zone_id,
                namespace,
                credential_out,
            } => {
                let args = commands::provision::ProvisionArgs {
                    domain: domain.clone(),
                    zone_id: zone_id.clone(),
                    namespace: namespace.clone(),
                };
                commands::provision::run(settings, args, credential_out.as_deref(), cli.format).await
            }
            Commands::Domain(cmd) => commands::domain::run(&settings, cmd, cli.format).await,
            Commands::Resolve { host, root, tenants } => {
                commands::resolve::run(&settings, host, root.as_deref(), tenants.as_deref(), cli.format)
                    .await
            }
            Commands::Config(cmd) => commands::config::run(&settings, cmd, cli.format),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            if cli.verbose {
                for cause in e.chain().skip(1) {
                    eprintln!("{}: {}", "Caused by".yellow(), cause);
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "hostplane",
            "--format",
            "json",
            "resolve",
            "acme.platform.com:8443",
            "--root",
            "platform.com",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Resolve { host, root, tenants } => {
                assert_eq!(host, "acme.platform.com:8443");
                assert_eq!(root.as_deref(), Some("platform.com"));
                assert!(tenants.is_none());
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn test_parse_domain_remove() {
        let cli = Cli::try_parse_from(["hostplane", "domain", "remove", "shop.example.org"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Domain(DomainCommands::Remove { ref hostname }) if hostname == "shop.example.org"
        ));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["hostplane", "--format", "xml", "config", "show"]).is_err());
    }
}
