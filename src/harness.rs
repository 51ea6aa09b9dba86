use crate::config::load_config_file;
use crate::pipeline::{CrawlOptions, crawl, resolve_database_path};
use crate::store::{CatalogStore, SqliteStore};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub config_path: PathBuf,
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub entries_extracted: usize,
    pub first_run_brands: usize,
    pub first_run_models: usize,
    pub first_run_years: usize,
    pub second_run_rows: usize,
    pub failures: usize,
    pub total_brands: usize,
    pub total_models: usize,
    pub total_years: usize,
}

/// Crawls twice into a fresh database; a stable catalog inserts nothing the second time.
pub fn run_harness(options: &HarnessOptions) -> Result<HarnessReport> {
    let loaded = load_config_file(&options.config_path)?;
    let database_path = resolve_database_path(&loaded, options.database_path.as_ref())?;
    if database_path.exists() {
        std::fs::remove_file(&database_path).with_context(|| {
            format!("failed to remove harness database {}", database_path.display())
        })?;
    }

    let crawl_options = CrawlOptions {
        config_path: options.config_path.clone(),
        database_path: Some(database_path.clone()),
    };
    let first = crawl(&crawl_options)?;
    let second = crawl(&crawl_options)?;

    let counts = SqliteStore::open(&database_path)?.counts()?;

    Ok(HarnessReport {
        entries_extracted: first.entries_extracted,
        first_run_brands: first.persist.brands_inserted,
        first_run_models: first.persist.models_inserted,
        first_run_years: first.persist.years_inserted,
        second_run_rows: second.persist.rows_inserted(),
        failures: first.persist.failures.len() + second.persist.failures.len(),
        total_brands: counts.brands,
        total_models: counts.models,
        total_years: counts.years,
    })
}
