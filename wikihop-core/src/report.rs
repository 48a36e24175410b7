// Rendering of search outcomes and cache statistics

use crate::data::CacheStats;
use crate::query::{QueryResponse, QueryStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub start: String,
    pub end: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_expanded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub elapsed_ms: u128,
}

impl SearchReport {
    pub fn new(start: &str, end: &str, response: &QueryResponse, elapsed: Duration) -> Self {
        let path = response.result.as_ref().and_then(|r| {
            r.path
                .as_ref()
                .map(|p| p.iter().map(|page| page.to_string()).collect::<Vec<_>>())
        });
        let message = match response.status {
            QueryStatus::Found => None,
            QueryStatus::NotFound => response.body["message"].as_str().map(str::to_string),
            QueryStatus::BadRequest => response.body["error"].as_str().map(str::to_string),
        };
        let status = match response.status {
            QueryStatus::Found => "found",
            QueryStatus::NotFound => "not_found",
            QueryStatus::BadRequest => "bad_request",
        };

        Self {
            start: start.to_string(),
            end: end.to_string(),
            status: status.to_string(),
            hops: path.as_ref().map(|p| p.len().saturating_sub(1)),
            path,
            nodes_expanded: response.nodes_expanded(),
            message,
            elapsed_ms: elapsed.as_millis(),
        }
    }
}

pub fn generate_text_report(report: &SearchReport) -> String {
    let mut out = String::new();
    out.push_str(RULE);
    out.push_str("\n\n");
    out.push_str(&format!("  From: {}\n", report.start));
    out.push_str(&format!("  To:   {}\n\n", report.end));

    match &report.path {
        Some(path) => {
            let hops = report.hops.unwrap_or(0);
            let noun = if hops == 1 { "hop" } else { "hops" };
            out.push_str(&format!(
                "{} {}\n\n",
                "✓".green().bold(),
                format!("Path found: {} {}", hops, noun).green().bold()
            ));
            for (idx, page) in path.iter().enumerate() {
                out.push_str(&format!("  {:>2}. {}\n", idx + 1, page));
            }
            out.push('\n');
        }
        None => {
            let message = report.message.as_deref().unwrap_or("No path found");
            let mark = if report.status == "bad_request" {
                "✗".red().bold()
            } else {
                "⚠".yellow().bold()
            };
            out.push_str(&format!("{} {}\n\n", mark, message));
        }
    }

    if let Some(expanded) = report.nodes_expanded {
        out.push_str(&format!("  Pages expanded: {}\n", expanded));
    }
    out.push_str(&format!("  Elapsed:        {} ms\n", report.elapsed_ms));
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
    out
}

pub fn generate_json_report(report: &SearchReport) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "metadata": {
            "generator": "wikihop",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": Utc::now().to_rfc3339(),
        },
        "search": report,
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn render(report: &SearchReport, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

pub fn generate_cache_report(stats: &CacheStats, location: &Path, ttl: Option<Duration>) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Link cache: {}\n", location.display()));
    out.push_str(&format!("  Entries:  {}\n", stats.entries));
    match ttl {
        Some(ttl) => out.push_str(&format!(
            "  Expired:  {} (ttl {}h)\n",
            stats.expired,
            ttl.as_secs() / 3600
        )),
        None => out.push_str("  Expired:  - (no ttl)\n"),
    }
    if let Some(oldest) = stats.oldest {
        out.push_str(&format!("  Oldest:   {}\n", format_timestamp(oldest)));
    }
    if let Some(newest) = stats.newest {
        out.push_str(&format!("  Newest:   {}\n", format_timestamp(newest)));
    }
    out
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
