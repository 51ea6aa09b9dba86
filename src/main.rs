use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use motocat::harness::{HarnessOptions, run_harness};
use motocat::pipeline::{CrawlOptions, ExtractOptions, catalog_stats, crawl, extract_listings};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "motocat", about = "Motorcycle catalog extractor for parts listings pages")]
struct Cli {
    #[arg(long, default_value = "configs/catalog.toml")]
    config: PathBuf,

    /// SQLite database path; overrides [store].database_path.
    #[arg(long, env = "MOTOCAT_DATABASE")]
    database: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Crawl,
    Extract,
    Stats,
    Harness,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let crawl_options = CrawlOptions {
        config_path: cli.config.clone(),
        database_path: cli.database.clone(),
    };

    match cli.command {
        Commands::Crawl => {
            let report = crawl(&crawl_options)?;
            info!(
                source = %report.source_key,
                anchors = report.anchors_seen,
                ignored = report.anchors_ignored,
                entries = report.entries_extracted,
                brands = report.persist.brands_inserted,
                models = report.persist.models_inserted,
                years = report.persist.years_inserted,
                failures = report.persist.failures.len(),
                "crawl summary"
            );
            for failure in &report.persist.failures {
                info!(
                    brand = %failure.brand,
                    model = %failure.model,
                    href = %failure.source_href,
                    reason = %failure.reason,
                    "entry not persisted"
                );
            }
        }
        Commands::Extract => {
            let entries = extract_listings(&ExtractOptions {
                config_path: cli.config,
            })?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Stats => {
            let counts = catalog_stats(&crawl_options)?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        Commands::Harness => {
            let report = run_harness(&HarnessOptions {
                config_path: cli.config,
                database_path: cli.database,
            })?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.try_init(),
    };
    result.map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}
