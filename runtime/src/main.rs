// Copyright 2026 Oil Price Sensor Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use oil_price_sensor::cli::{self, output};
use oil_price_sensor::config::Settings;
use oil_price_sensor::{logging, SensorError};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "oil-price-sensor",
    about = "Scrape the regional heating-oil price and publish it to Home Assistant",
    version,
    after_help = "Configuration is read from the environment (ZIPCODE, LOG_LEVEL, FETCH_MODE, HA_URL, ...).\nRun 'oil-price-sensor' with no command to scrape and publish once."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the price and publish it to the hub (default)
    Run,
    /// Scrape and print the price without publishing
    Scrape,
    /// Fetch the page and report what it contains
    Diagnose {
        /// Save the raw response body to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Check configuration, hub tokens and Chromium (exit 1 when not ready)
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    output::set_flags(output::OutputFlags {
        json: cli.json,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    let settings = Settings::from_env();
    let level = settings
        .as_ref()
        .map(|s| s.log_level.as_str())
        .unwrap_or("info");
    logging::init(level, cli.verbose, cli.json);

    let result = match cli.command {
        None | Some(Commands::Run) => match &settings {
            Ok(s) => cli::run_cmd::run(s).await,
            Err(e) => Err(SensorError::from(e.clone()).into()),
        },
        Some(Commands::Scrape) => match &settings {
            Ok(s) => cli::scrape_cmd::run(s).await,
            Err(e) => Err(SensorError::from(e.clone()).into()),
        },
        Some(Commands::Diagnose { save }) => match &settings {
            Ok(s) => cli::diagnose_cmd::run(s, save.as_deref()).await,
            Err(e) => Err(SensorError::from(e.clone()).into()),
        },
        Some(Commands::Doctor) => match cli::doctor::run(&settings).await {
            // The report already says NOT READY; only the exit code is left.
            Ok(false) => std::process::exit(1),
            other => other.map(|_| ()),
        },
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "oil-price-sensor", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        let kind = e
            .downcast_ref::<SensorError>()
            .map(SensorError::kind)
            .unwrap_or("other");
        tracing::error!(kind, "run failed: {e:#}");

        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "kind": kind,
                "message": format!("{e:#}"),
            }));
        } else if !output::is_quiet() {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
