//! # Crossing Tables Entry Point
//!
//! Parses council tide tables into the crossing dataset, or plans a walk from
//! an existing dataset.
//!
//! ```text
//! parse-tides sourcedata/09-25.html   # one month -> data/tides-2025-09.json
//! parse-tides sourcedata/             # every month -> data/tides.json
//! parse-tides plan --date 2025-09-05  # walking plan from data/tides.json
//! ```

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use crossing_lib::{
    aggregate::{month_output_name, write_dataset, Aggregator, COMBINED_OUTPUT},
    config::Config,
    planner,
    solar::{SolarEnricher, SunriseSunsetClient},
    DayWindows,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "parse-tides",
    about = "Extract safe causeway crossing windows from tide tables"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Tide table file (MM-YY.html) or a directory of them
    input: Option<PathBuf>,

    /// Directory to write the JSON dataset to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a walk for the first safe window on a date
    Plan {
        /// Crossing date, YYYY-MM-DD
        #[arg(short, long)]
        date: NaiveDate,

        /// Dataset to read (default: <output dir>/tides.json)
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    if let Some(Command::Plan { date, data }) = cli.command {
        let data = data.unwrap_or_else(|| config.output.dir.join(COMBINED_OUTPUT));
        return plan(&config, date, &data);
    }

    let input = cli
        .input
        .unwrap_or_else(|| config.output.default_input.clone());
    let output_dir = cli.output_dir.unwrap_or_else(|| config.output.dir.clone());

    if !input.exists() {
        bail!("Path not found: {}", input.display());
    }

    // Create Tokio runtime for the solar lookups
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(parse(&config, &input, &output_dir))
}

async fn parse(config: &Config, input: &Path, output_dir: &Path) -> anyhow::Result<()> {
    let client = SunriseSunsetClient::new(&config.solar, &config.location)
        .context("failed to build solar data client")?;
    let enricher = SolarEnricher::new(client, config.solar.courtesy_delay());
    let mut aggregator = Aggregator::new(enricher, config.output.source_label.clone());

    if input.is_dir() {
        let report = aggregator
            .directory(input)
            .await
            .with_context(|| format!("failed to process {}", input.display()))?;
        let path = write_dataset(&report.dataset, output_dir, COMBINED_OUTPUT)?;

        let months = report.dataset.months.as_deref().unwrap_or_default();
        println!("Combined tide data created");
        println!(
            "{} total days across {} months",
            report.dataset.total_days.unwrap_or_default(),
            months.len()
        );
        for skipped in &report.skipped {
            println!("Skipped: {}", skipped.display());
        }
        for conflict in &report.conflicts {
            println!(
                "Date {} in {} replaced by {}",
                conflict.date,
                conflict.earlier.display(),
                conflict.later.display()
            );
        }
        println!("Output: {}", path.display());
        print_sample(&report.dataset.data)?;
    } else {
        let (month, dataset) = aggregator
            .single_file(input)
            .await
            .with_context(|| format!("failed to process {}", input.display()))?;
        let path = write_dataset(&dataset, output_dir, &month_output_name(&month))?;

        println!("Parsed tide data for {}", month.label());
        println!("{} days processed", dataset.data.len());
        println!("Output: {}", path.display());
        print_sample(&dataset.data)?;
    }

    Ok(())
}

fn plan(config: &Config, date: NaiveDate, data: &Path) -> anyhow::Result<()> {
    let dataset = planner::load_dataset(data)
        .with_context(|| format!("could not load crossing data from {}", data.display()))?;
    let plan = planner::plan_for_date(&dataset, date, &config.planner)?;

    println!(
        "Safe crossing on {date} from {} until {}.",
        plan.start, plan.end
    );
    println!("Arrive at the causeway no later than {}", plan.arrive_by);
    println!("Complete your crossing before {}", plan.midpoint);
    println!("Depart at {} (Naismith's Rule)", plan.depart_at);
    if plan.unusual_duration {
        println!(
            "Warning: a {}h{:02}m window is outside the typical range; double-check the times.",
            plan.duration_minutes / 60,
            plan.duration_minutes % 60
        );
    }
    Ok(())
}

fn print_sample(data: &DayWindows) -> anyhow::Result<()> {
    if let Some((date, windows)) = data.iter().next() {
        println!();
        println!("Sample data ({date}):");
        println!("{}", serde_json::to_string_pretty(windows)?);
    }
    Ok(())
}
