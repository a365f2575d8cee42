//! Rotulador: WCAG 2.4.6 compliance auditor CLI.
//!
//! ## Usage
//!
//! ```bash
//! rotulador https://example.com                 # audit one page
//! rotulador https://example.com --json          # machine-readable report
//! rotulador https://example.com --batch -v      # one judgment call, debug logs
//! ```
//!
//! Exit codes: 0 compliant, 1 run failure, 2 audited but non-compliant.

mod cli;
mod output;

use std::process::ExitCode;

use clap::Parser;
use rotular::ComplianceReport;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Audit(#[from] rotular::AuditError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Generic(String),
}

type CliResult<T> = Result<T, CliError>;

const EXIT_NON_COMPLIANT: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(execute(&cli))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_report(&report);
    }

    Ok(if report.wcag_2_4_6_compliant {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_NON_COMPLIANT)
    })
}

/// Logs go to stderr; stdout is reserved for the report.
fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        "rotular=error"
    } else {
        match cli.verbose {
            0 => "rotular=info",
            1 => "rotular=debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(all(feature = "browser", feature = "llm"))]
async fn execute(cli: &Cli) -> CliResult<ComplianceReport> {
    use rotular::{AuditConfig, Auditor, BrowserConfig, BrowserSession, FallbackDepth, LlmJudge};

    let mut browser_config = BrowserConfig::default()
        .with_headless(!cli.headed)
        .with_nav_timeout_ms(cli.nav_timeout_ms);
    if cli.no_sandbox {
        browser_config = browser_config.with_no_sandbox();
    }
    if let Some(path) = &cli.chromium_path {
        browser_config = browser_config.with_chromium_path(path);
    }

    let session = BrowserSession::launch(browser_config).await?;
    let judge = LlmJudge::new(&cli.endpoint, &cli.model, cli.api_key.clone());
    let config = AuditConfig {
        fallback_depth: if cli.minimal_fallback {
            FallbackDepth::Minimal
        } else {
            FallbackDepth::Full
        },
        batch: cli.batch,
    };

    Ok(Auditor::with_config(session, judge, config)
        .run(&cli.url)
        .await?)
}

#[cfg(not(all(feature = "browser", feature = "llm")))]
async fn execute(_cli: &Cli) -> CliResult<ComplianceReport> {
    Err(CliError::Generic(
        "browser and llm support not enabled. Rebuild with --features browser,llm".to_string(),
    ))
}
