//! Write the markdown IDA validation report.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ida_postprocess::prelude::*;

#[derive(Parser)]
#[command(name = "generate-ida-report")]
#[command(about = "Generate the IDA validation report in markdown", long_about = None)]
struct Cli {
    /// Directory containing the IDA results
    #[arg(long, default_value = "ida")]
    ida_dir: PathBuf,
    /// Output report file
    #[arg(long, default_value = "IDA_VALIDATION_REPORT.md")]
    output: PathBuf,
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
                .unwrap_or_else(|_| "ida_postprocess=info,generate_ida_report=info".into()),
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
    let summary_name = cli.summary.as_deref().unwrap_or(&config.summary_file);

    println!("{}", "=".repeat(60));
    println!("Generating IDA Validation Report");
    println!("{}", "=".repeat(60));
    println!("IDA directory: {}", cli.ida_dir.display());
    println!("Output:        {}", cli.output.display());
    println!();

    let loaded = load_summary(&cli.ida_dir, summary_name, &config)
        .context("failed to load the summary table")?;

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let ctx = ReportContext::new(&cli.ida_dir, &loaded.summary_path, generated_at);
    let report = render_report(&loaded.results, &loaded.hinge_map, &config, &ctx)?;
    write_report(&cli.output, &report)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    println!();
    println!("{}", "=".repeat(60));
    println!("Report generation complete!");
    println!("{}", "=".repeat(60));
    println!();
    println!("View report: {}", cli.output.display());
    println!();
    Ok(())
}
