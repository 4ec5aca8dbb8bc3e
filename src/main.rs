//! hist-schedule - Historical Schedule Compiler
//!
//! Compiles well history tables into simulator SCHEDULE include files.
//!
//! # Usage
//!
//! ```bash
//! # Monthly controls, completions and manual ops -> HIST.SCH
//! hist-schedule schedule --input data/ --output model/ \
//!     --start 2015-01-01 --end 2023-12-01 --field "Field A"
//!
//! # Well paths -> WELLTRACK.INC
//! hist-schedule welltrack --input data/ --output model/ --field "Field A"
//!
//! # Show the effective configuration
//! hist-schedule print-config --config hist_schedule.toml
//! ```
//!
//! # Environment Variables
//!
//! - `HIST_SCHEDULE_CONFIG`: Path to a TOML config file (default: ./hist_schedule.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use hist_schedule::config::CompilerConfig;
use hist_schedule::schedule::{self, ScheduleRequest};
use hist_schedule::welltrack;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "hist-schedule")]
#[command(about = "Historical schedule compiler for reservoir simulation models")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file; overrides HIST_SCHEDULE_CONFIG and ./hist_schedule.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Compile production, perforation and manual-ops history into the schedule file
    Schedule {
        /// Directory holding the input tables
        #[arg(long, value_name = "DIR")]
        input: PathBuf,
        /// Directory the schedule file is written to (created if missing)
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
        /// Simulation start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Last date covered (YYYY-MM-DD, inclusive)
        #[arg(long)]
        end: NaiveDate,
        /// Field whose wells are compiled
        #[arg(long)]
        field: String,
    },

    /// Compile well trajectories into the WELSPECS/WELLTRACK include file
    Welltrack {
        /// Directory holding the input tables
        #[arg(long, value_name = "DIR")]
        input: PathBuf,
        /// Directory the include file is written to (created if missing)
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
        /// Field whose wells are compiled
        #[arg(long)]
        field: String,
    },

    /// Print the effective configuration as TOML
    PrintConfig,
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let (config, provenance) =
        CompilerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = &provenance.path {
        info!(
            path = %path.display(),
            overrides = provenance.explicit_keys.len(),
            "Configuration loaded"
        );
    }

    match args.command {
        SubCommand::Schedule {
            input,
            output,
            start,
            end,
            field,
        } => {
            ensure_dir(&output)?;
            let request = ScheduleRequest { start, end, field };
            let summary = schedule::compile_schedule(&config, &input, &output, &request)
                .with_context(|| {
                    format!("Failed to compile schedule for field '{}'", request.field)
                })?;
            info!(
                output = %summary.output.display(),
                periods = summary.walk.periods,
                "{}",
                summary.stats
            );
        }
        SubCommand::Welltrack {
            input,
            output,
            field,
        } => {
            ensure_dir(&output)?;
            let summary = welltrack::compile_welltracks(&config, &input, &output, &field)
                .with_context(|| format!("Failed to compile well paths for field '{field}'"))?;
            info!(
                output = %summary.output.display(),
                wells = summary.wells,
                "{}",
                summary.stats
            );
        }
        SubCommand::PrintConfig => {
            let text = config.to_toml().context("Failed to serialize configuration")?;
            print!("{text}");
        }
    }

    Ok(())
}
