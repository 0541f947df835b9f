use aggregator::aggregate_market;
use analytics::AnalyticsEngine;
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use configuration::{Overrides, Settings, SourceKind};
use core_types::{MonthlyMarketReturn, RawTables, ReferenceFactorRow, SampleWindow};
use datasource::{CsvSource, PostgresSource, RawDataSource};
use indicatif::{ProgressBar, ProgressStyle};
use panel::{UniverseFilter, clean_delistings, clean_reference, clean_security_months, compose_returns};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

mod display;

/// The main entry point for the market return replication.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let mut settings = configuration::load_settings(cli.config.as_deref())
        .context("Failed to load configuration")?;
    settings.apply(cli.overrides);
    settings.validate().context("Invalid configuration")?;

    // Held until the end of main so the file appender flushes.
    let _log_guard = configuration::logging::init(&settings.logging)?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("replication", %run_id);

    let command = cli.command.unwrap_or(Commands::Compare);
    run(command, cli.format, &settings).instrument(span).await
}

/// Executes one command; every log line it emits carries the run id.
async fn run(command: Commands, format: OutputFormat, settings: &Settings) -> anyhow::Result<()> {
    match command {
        Commands::Compare => {
            let replication = replicate(settings).await?;
            let report = AnalyticsEngine::new(settings.comparison.basis)
                .compare(&replication.monthly, &replication.reference)
                .context("Failed to compare the replicated series")?;

            match format {
                OutputFormat::Table => display::print_comparison(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Series => {
            let replication = replicate(settings).await?;

            match format {
                OutputFormat::Table => println!("{}", display::series_table(&replication.monthly)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&replication.monthly)?)
                }
            }
        }
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Replicates the value-weighted U.S. equity market excess return from
/// security-level data and compares it with the published factor series.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the TOML settings file (default: ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How results are printed.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Compare the replicated series with the reference series (default).
    Compare,
    /// Print the replicated monthly series.
    Series,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Table,
    Json,
}

// ==============================================================================
// Pipeline
// ==============================================================================

/// Output of the replication stages, ready for comparison or printing.
struct Replication {
    monthly: Vec<MonthlyMarketReturn>,
    reference: Vec<ReferenceFactorRow>,
}

/// Runs fetch → clean → join → filter → aggregate.
async fn replicate(settings: &Settings) -> anyhow::Result<Replication> {
    let window = settings.window()?;
    tracing::info!(start = %window.start, end = %window.end, source = ?settings.source.kind, "Starting replication.");

    let raw = fetch_raw_tables(settings, &window).await?;

    let observations =
        clean_security_months(raw.security_months).context("Failed to clean security months")?;
    let delistings = clean_delistings(raw.delistings).context("Failed to clean delistings")?;
    let reference = clean_reference(raw.factors).context("Failed to clean reference factors")?;

    let enriched = compose_returns(&observations, &delistings);
    drop(observations);

    let panel = UniverseFilter::from(&settings.universe).build_panel(enriched);
    let monthly =
        aggregate_market(&panel, &reference).context("Failed to aggregate market returns")?;

    Ok(Replication { monthly, reference })
}

/// The only phase that touches the outside world; the connection (if any)
/// is released before this returns.
async fn fetch_raw_tables(settings: &Settings, window: &SampleWindow) -> anyhow::Result<RawTables> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Fetching raw tables...");

    let result = match settings.source.kind {
        SourceKind::Postgres => {
            PostgresSource::new(settings.source.tables.clone())
                .fetch_raw_tables(window)
                .await
        }
        SourceKind::Csv => {
            let directory = settings
                .source
                .csv_dir
                .clone()
                .context("source.csv_dir is not set")?;
            CsvSource::new(directory).fetch_raw_tables(window).await
        }
    };

    spinner.finish_and_clear();
    result.context("Failed to fetch raw tables")
}
