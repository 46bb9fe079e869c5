//! Extract IDA results from the per-amplitude CalculiX dumps into a summary CSV.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ida_postprocess::prelude::*;

#[derive(Parser)]
#[command(name = "extract-ida-results")]
#[command(about = "Extract peak/residual drift metrics from IDA result dumps", long_about = None)]
struct Cli {
    /// Directory containing the IDA results
    #[arg(long, default_value = "ida")]
    ida_dir: PathBuf,
    /// Output CSV file name, written inside the IDA directory
    #[arg(long, default_value = "ida_results_summary.csv")]
    output: String,
    /// Start amplitude (g)
    #[arg(long, default_value_t = 0.1)]
    start: f64,
    /// End amplitude (g), inclusive
    #[arg(long, default_value_t = 1.0)]
    end: f64,
    /// Amplitude step (g)
    #[arg(long, default_value_t = 0.1)]
    step: f64,
    /// Optional JSON configuration overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ida_postprocess=info,extract_ida_results=info".into()),
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
    let range = AmplitudeRange::new(cli.start, cli.end, cli.step);

    println!("{}", "=".repeat(50));
    println!("Extracting IDA Results");
    println!("{}", "=".repeat(50));
    println!("IDA directory: {}", cli.ida_dir.display());
    println!("Output file:   {}", cli.output);
    println!();

    let outcome = run_extraction(&cli.ida_dir, &cli.output, &range, &config)?;

    println!();
    println!("Extracted {} results ({} skipped)", outcome.results.len(), outcome.skipped());
    println!("Results written to: {}", outcome.summary_path.display());
    println!();

    println!("Summary:");
    println!("  Total amplitudes analyzed: {}", outcome.results.len());
    match IdaSummary::from_metrics(&outcome.results, &config.assessment, config.collapse_drift_pct) {
        Some(summary) => {
            match summary.collapse_amplitude() {
                Some(amplitude) => println!("  Collapse detected at:      {:.1}g", amplitude),
                None => println!("  No collapse detected up to {}g", cli.end),
            }
            println!(
                "  Maximum drift:             {:.2}% at {:.1}g",
                summary.max_drift_pct, summary.max_drift_amplitude
            );
        }
        None => println!("  No amplitude produced displacement data"),
    }

    println!();
    println!("Next steps:");
    println!("  plot-ida-validation --ida-dir {}", cli.ida_dir.display());
    println!();
    Ok(())
}
