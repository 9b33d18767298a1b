//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use male_engine::policy::{FieldIssue, Severity};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print validation issues, errors in red and warnings in yellow
pub fn print_issues(issues: &[FieldIssue]) {
    for issue in issues {
        match issue.severity {
            Severity::Error => print_error(&issue.to_string()),
            Severity::Warning => print_warning(&issue.to_string()),
        }
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" | "applied" | "admit" => status.green().to_string(),
        "degraded" | "warning" => status.yellow().to_string(),
        "unhealthy" | "error" | "failed" | "reject" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a rank or MALE value on the 0..1000 scale
pub fn color_rank(rank: i64) -> String {
    let formatted = rank.to_string();
    if rank >= 700 {
        formatted.green().to_string()
    } else if rank >= 300 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}

/// Format an external score, which may carry decimals
pub fn format_score(score: f64) -> String {
    format!("{:.1}", score)
}

/// Format a unix timestamp in UTC
pub fn format_unix(ts: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Show `-` for empty values in tables
pub fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}
