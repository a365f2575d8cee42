//! Command-line argument definitions.

use clap::Parser;

/// WCAG 2.4.6 headings-and-labels compliance auditor.
///
/// Audits every heading (h1-h6) and form label on the rendered page
/// and reports which of them fail to describe their topic or purpose.
#[derive(Debug, Parser)]
#[command(name = "rotulador", version, about)]
pub struct Cli {
    /// Page URL to audit
    pub url: String,

    /// Path to the chromium binary (auto-detected when unset)
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Run with a visible browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the browser sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value_t = 30_000)]
    pub nav_timeout_ms: u64,

    /// Judgment endpoint base URL (OpenAI-compatible chat completions)
    #[arg(long, env = "ROTULAR_ENDPOINT", default_value = "http://localhost:8081")]
    pub endpoint: String,

    /// Model name sent to the judgment endpoint
    #[arg(long, env = "ROTULAR_MODEL", default_value = "qwen-coder")]
    pub model: String,

    /// Bearer token for the judgment endpoint
    #[arg(long, env = "ROTULAR_API_KEY")]
    pub api_key: Option<String>,

    /// Judge every element in one call instead of one call per element
    #[arg(long)]
    pub batch: bool,

    /// Restrict text fallbacks to rendered text, alt, and aria-label
    #[arg(long)]
    pub minimal_fallback: bool,

    /// Emit the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
