//! Output formatting utilities

use colored::Colorize;
use hostplane_core::HostnameStatus;
use serde::Serialize;

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// Serialize `value` for the machine-readable formats; `None` for text.
pub fn format_output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(value)?)),
        OutputFormat::Yaml => Ok(Some(serde_yaml::to_string(value)?)),
    }
}

/// Print `value` as JSON or YAML. Returns false for text, which the caller renders.
pub fn emit<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<bool> {
    match format_output(value, format)? {
        Some(rendered) => {
            println!("{}", rendered.trim_end());
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print a key-value pair
pub fn key_value(key: &str, value: &str) {
    println!("{}: {}", key.bold(), value);
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

/// Colored hostname status label
pub fn status_label(status: HostnameStatus) -> colored::ColoredString {
    match status {
        HostnameStatus::Active => "active".green(),
        HostnameStatus::Pending => "pending".yellow(),
        HostnameStatus::Error => "error".red(),
        HostnameStatus::NotFound => "not found".dimmed(),
    }
}
