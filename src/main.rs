//! wifi-insights: guest segmentation for captive-portal WiFi connection logs
//!
//! This is the main entrypoint: it sets up logging, loads the configuration
//! and hands the command to the library. Logs go to stderr so stdout carries
//! only the command output.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tracing::error;
use wifi_insights::cli::Args;
use wifi_insights::config::AppConfig;
use wifi_insights::output;
use wifi_insights::{commands, Error};

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::FAILURE
        }
    }
}

/// Request errors are shown as-is; anything else is logged and summarized
fn report_failure(e: &anyhow::Error) {
    match e.downcast_ref::<Error>() {
        Some(err) if err.is_user_facing() => output::print_error(&err.to_string()),
        _ => {
            error!("{:#}", e);
            output::print_error("The request failed. Run with --verbose for details.");
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = AppConfig::load(&args.config).with_context(|| {
        format!("failed to load configuration from {}", args.config.display())
    })?;
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::execute(
        &config,
        args.command,
        args.user.as_deref(),
        args.password.as_deref(),
        args.format,
        &mut out,
    )?;
    out.flush()?;
    Ok(())
}
