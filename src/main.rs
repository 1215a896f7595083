//! FLARE command-line front end
//!
//! # Usage
//!
//! ```bash
//! # Score every campaign in a CSV export
//! flare analyze campaigns.csv
//!
//! # One campaign, machine-readable
//! flare analyze campaigns.csv --campaign C1 --json
//!
//! # Check a file without scoring it
//! flare validate campaigns.csv
//!
//! # Print the effective configuration as TOML
//! flare --config tuned.toml show-config
//! ```
//!
//! # Environment Variables
//!
//! - `FLARE_CONFIG`: Path to a config file (overridden by `--config`)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use flare::{FatigueReport, FatigueResult, FlareConfig, FlareEngine, RawTable};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "flare")]
#[command(about = "FLARE ad-fatigue scoring engine")]
#[command(version)]
struct CliArgs {
    /// Path to flare_config.toml (default: $FLARE_CONFIG, then ./flare_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Score campaigns and print stages, waste and recommendations
    Analyze {
        /// CSV with date, campaign_id, impressions, clicks, spend (+ optional metrics)
        csv: PathBuf,
        /// Only report this campaign
        #[arg(long)]
        campaign: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a CSV without scoring it
    Validate {
        csv: PathBuf,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

// ============================================================================
// Output
// ============================================================================

fn print_result(result: &FatigueResult) {
    println!(
        "  {:<20} FRI {:>5.1}  {:<8}  risk {:<8}  spend {:>12.2}  wasted {:>12.2}{}",
        result.campaign_id,
        result.fri,
        result.stage,
        result.risk_level,
        result.total_spend(),
        result.wasted_spend(),
        if result.age_guarded { "  (insufficient history)" } else { "" }
    );
    for rec in &result.recommendations {
        println!("      [{:<6}] {} - {}", rec.priority, rec.action, rec.rationale);
    }
}

fn print_report(report: &FatigueReport) {
    let overview = report.overview();
    println!();
    println!("  FLARE Fatigue Report");
    println!("  ====================");
    if let Some(warning) = report.warning() {
        println!("  WARNING: {warning}");
    }
    println!(
        "  Campaigns: {}   Total spend: {:.2}   Wasted: {:.2} ({:.1}%)",
        overview.total_campaigns,
        overview.total_spend,
        overview.total_wasted_spend,
        overview.waste_percentage
    );
    let counts: Vec<String> = overview
        .stage_counts
        .iter()
        .map(|(stage, n)| format!("{stage}: {n}"))
        .collect();
    println!("  Stages: {}", counts.join(", "));
    if !overview.high_risk_campaigns.is_empty() {
        println!("  High risk: {}", overview.high_risk_campaigns.join(", "));
    }
    println!();
    for result in report.results() {
        print_result(result);
    }
    for err in report.campaign_errors() {
        println!("  EXCLUDED: {err}");
    }
    println!();
}

// ============================================================================
// Commands
// ============================================================================

fn load_table(path: &Path) -> Result<RawTable> {
    RawTable::from_csv_file(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn analyze(engine: &FlareEngine, csv: &Path, campaign: Option<&str>, json: bool) -> Result<()> {
    let table = load_table(csv)?;
    let report = engine.process(&table).context("Input validation failed")?;

    match campaign {
        Some(id) => {
            let Some(result) = report.detail(id) else {
                bail!("Campaign '{id}' not found in {}", csv.display());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                print_result(result);
            }
        }
        None => {
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }
    Ok(())
}

fn validate(engine: &FlareEngine, csv: &Path) -> Result<()> {
    let table = load_table(csv)?;
    let outcome = engine.validate(&table);
    match (outcome.is_valid, outcome.message.as_deref()) {
        (true, None) => println!("OK: {} rows, full analysis mode", table.len()),
        (true, Some(msg)) => println!("OK: {} rows. {msg}", table.len()),
        (false, msg) => bail!("Invalid input: {}", msg.unwrap_or("unknown error")),
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = FlareConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        SubCommand::ShowConfig => {
            print!("{}", config.to_toml()?);
        }
        SubCommand::Validate { csv } => {
            validate(&FlareEngine::new(config), &csv)?;
        }
        SubCommand::Analyze { csv, campaign, json } => {
            info!(path = %csv.display(), parallel = config.engine.parallel, "Analyzing campaigns");
            analyze(&FlareEngine::new(config), &csv, campaign.as_deref(), json)?;
        }
    }
    Ok(())
}
