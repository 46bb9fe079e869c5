//! Render the IDA validation charts from the summary CSV.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ida_postprocess::plots::load_drift_histories;
use ida_postprocess::prelude::*;

#[derive(Parser)]
#[command(name = "plot-ida-validation")]
#[command(about = "Generate IDA validation plots (PNG and SVG)", long_about = None)]
struct Cli {
    /// Directory containing the IDA results
    #[arg(long, default_value = "ida")]
    ida_dir: PathBuf,
    /// Output directory for plots (default: <ida-dir>/plots)
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Summary CSV file name inside the IDA directory
    #[arg(long)]
    summary: Option<String>,
    /// Optional JSON configuration overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ida_postprocess=info,plot_ida_validation=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = IdaConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| cli.ida_dir.join("plots"));
    let summary_name = cli.summary.as_deref().unwrap_or(&config.summary_file);

    println!("{}", "=".repeat(60));
    println!("Generating IDA Validation Plots");
    println!("{}", "=".repeat(60));
    println!("IDA directory:    {}", cli.ida_dir.display());
    println!("Output directory: {}", output_dir.display());
    println!();

    let loaded = load_summary(&cli.ida_dir, summary_name, &config)
        .context("failed to load the summary table")?;
    println!("Loaded {} results from {}", loaded.results.len(), summary_name);

    let histories = load_drift_histories(
        &cli.ida_dir,
        &loaded.results,
        loaded.hinge_map.geometry.height,
        &config,
    )?;
    let hinge_names = loaded
        .table
        .schema
        .hinge_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let data = PlotData::new(loaded.results, hinge_names, histories, &config)
        .ok_or_else(|| IdaError::EmptySummary(loaded.summary_path.clone()))?;

    let generator = PlotGenerator::new(&config, &output_dir);
    let written = generator.render_all(&data)?;

    println!();
    println!("{}", "=".repeat(60));
    println!("All plots generated successfully!");
    println!("{}", "=".repeat(60));
    println!();
    println!("Output files in {}:", generator.output_dir().display());
    for path in &written {
        if let Some(name) = path.file_name() {
            println!("  - {}", name.to_string_lossy());
        }
    }
    println!();
    Ok(())
}
