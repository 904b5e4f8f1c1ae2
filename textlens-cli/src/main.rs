//! textlens-cli - command-line client for a running Textlens server
//!
//! # Subcommands
//! - `process <text> [--json]` - summarize / extract keywords / classify sentiment
//! - `history [--json]`        - list every record processed since server start
//! - `status`                  - show server health

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "textlens-cli",
    version,
    about = "Textlens - summaries, keywords and sentiment from the command line"
)]
struct Cli {
    /// Textlens HTTP server URL (overrides TEXTLENS_HTTP_URL env var)
    #[arg(long, env = "TEXTLENS_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process a piece of text
    Process {
        /// Text to analyze
        text: String,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },

    /// Show every processed record, oldest first
    History {
        /// Print the raw JSON array
        #[arg(long)]
        json: bool,
    },

    /// Show Textlens server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// A processed record as returned by POST /process and GET /history
#[derive(Debug, Deserialize, Serialize)]
pub struct Record {
    pub original_text: String,
    pub summary: String,
    pub keywords: Vec<String>,
    pub sentiment: String,
}

/// Human-readable rendering of one record.
pub fn format_record(r: &Record) -> String {
    let preview: String = r.original_text.chars().take(80).collect();
    let ellipsis = if r.original_text.chars().count() > 80 {
        "…"
    } else {
        ""
    };
    format!(
        "Text:      {}{}\nSummary:   {}\nKeywords:  {}\nSentiment: {}",
        preview.replace('\n', " "),
        ellipsis,
        r.summary,
        r.keywords.join(", "),
        r.sentiment
    )
}

/// Pull the server's error message out of an error body, if it has one.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

fn do_process(server: &str, text: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/process", server);
    let resp = client(90)?
        .post(&url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .with_context(|| format!("connection failed to {}", url))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        anyhow::bail!("server returned {}: {}", status, error_message(&body));
    }

    let record: Record = resp.json().context("failed to parse process response")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", format_record(&record));
    }

    Ok(())
}

fn do_history(server: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/history", server);
    let resp = client(30)?
        .get(&url)
        .send()
        .with_context(|| format!("connection failed to {}", url))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        anyhow::bail!("server returned {}: {}", status, error_message(&body));
    }

    let records: Vec<Record> = resp.json().context("failed to parse history response")?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No records processed yet");
        return Ok(());
    }

    for (i, r) in records.iter().enumerate() {
        println!("#{}\n{}\n", i + 1, format_record(r));
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);
    let resp = client(10)?
        .get(&url)
        .send()
        .with_context(|| format!("cannot reach {}", url))?;

    if !resp.status().is_success() {
        anyhow::bail!("server unhealthy (HTTP {})", resp.status());
    }

    let body: serde_json::Value = resp.json().context("failed to parse health response")?;
    println!("{}", format_health(&body));

    Ok(())
}

/// Human-readable rendering of a GET /health body.
pub fn format_health(body: &serde_json::Value) -> String {
    format!(
        "Textlens server: {}\nVersion:         {}\nModel:           {}\nRecords:         {}",
        body["status"].as_str().unwrap_or("unknown"),
        body["version"].as_str().unwrap_or("?"),
        body["model"].as_str().unwrap_or("?"),
        body["records"].as_u64().unwrap_or(0)
    )
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Process { text, json } => do_process(&server, &text, json),
        Commands::History { json } => do_history(&server, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("textlens-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
