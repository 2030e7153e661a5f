//! Unit-Harvest main entry point
//!
//! This is the command-line interface for the Unit-Harvest catalog enricher.

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use unit_harvest::checkpoint::{load_resume_state, PendingSnapshot, ResumeSource};
use unit_harvest::config::{load_config_with_hash, Config};
use unit_harvest::endpoint::Endpoints;
use unit_harvest::harvest::{run_harvest, PendingOrigin};
use unit_harvest::HarvestError;

/// Unit-Harvest: a resumable catalog enricher
///
/// Unit-Harvest discovers units from a catalog listing, fetches each unit's
/// custom card and overview pages concurrently, and appends the extracted
/// facts to a line-delimited results log. Interrupted runs resume where they
/// stopped.
#[derive(Parser, Debug)]
#[command(name = "unit-harvest")]
#[command(version)]
#[command(about = "A resumable catalog enricher", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Ignore the pending snapshot and re-discover from the listing
    #[arg(long)]
    fresh: bool,

    /// Validate config and show resume state without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the results log and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.fresh)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_harvest(config, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("unit_harvest=info,warn"),
            1 => EnvFilter::new("unit_harvest=debug,info"),
            2 => EnvFilter::new("unit_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn snapshot_for(config: &Config) -> Option<PendingSnapshot> {
    config.output.snapshot_path().map(PendingSnapshot::new)
}

/// Handles the --dry-run mode: validates config and shows what a run would do
fn handle_dry_run(config: &Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Unit-Harvest Dry Run ===\n");

    let endpoints = Endpoints::new(&config.source)?;
    println!("Source:");
    println!("  Listing: {}", endpoints.listing_url());
    println!("  Detail path: {}", config.source.detail_path);
    println!("  Custom card path: {}", config.source.custom_card_path);

    let workers = config.harvest.worker_count();
    println!("\nHarvest:");
    println!("  Workers: {}", workers);
    println!(
        "  Queue capacity: {}",
        config.harvest.queue_capacity_for(workers)
    );
    println!(
        "  Timeouts: {}s request, {}s connect",
        config.harvest.request_timeout_secs, config.harvest.connect_timeout_secs
    );
    println!(
        "  Overview retries: {} ({}ms apart)",
        config.harvest.overview_retries, config.harvest.retry_delay_ms
    );
    println!("  User agent: {}", config.harvest.user_agent);

    println!("\nOutput:");
    println!("  Results log: {}", config.output.results_path);
    match config.output.snapshot_path() {
        Some(path) => println!("  Pending snapshot: {}", path),
        None => println!("  Pending snapshot: disabled"),
    }

    let snapshot = snapshot_for(config);
    let resume = load_resume_state(
        Path::new(&config.output.results_path),
        snapshot.as_ref(),
        fresh,
    )?;

    println!("\n✓ Configuration is valid");
    println!("✓ {} units already in results log", resume.completed.len());
    match resume.source {
        ResumeSource::Snapshot(entries) => {
            let remaining = entries
                .iter()
                .filter(|e| !resume.completed.contains(&e.id))
                .count();
            println!(
                "✓ Would resume {} units from the pending snapshot",
                remaining
            );
        }
        ResumeSource::Discovery => println!("✓ Would fetch the listing to discover units"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the results log
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use unit_harvest::output::{load_statistics, print_statistics};

    println!("Results log: {}\n", config.output.results_path);

    let snapshot = snapshot_for(config);
    let stats = load_statistics(Path::new(&config.output.results_path), snapshot.as_ref())?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, fresh: bool) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh discovery (ignoring pending snapshot)");
    } else {
        tracing::info!("Starting harvest (will resume if a pending snapshot exists)");
    }

    match run_harvest(config, fresh).await {
        Ok(report) => {
            let origin = match report.origin {
                PendingOrigin::Discovery => "listing",
                PendingOrigin::Snapshot => "pending snapshot",
            };
            tracing::info!(
                "Harvest completed successfully: {} written from {} ({} skipped as completed, {} duplicates) in {}s",
                report.written,
                origin,
                report.skipped_completed,
                report.skipped_duplicates,
                report.duration_seconds()
            );
            Ok(())
        }
        Err(HarvestError::Interrupted { remaining }) => {
            tracing::warn!(
                "Harvest stopped with {} units pending; run again to resume",
                remaining
            );
            Err(HarvestError::Interrupted { remaining }.into())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
