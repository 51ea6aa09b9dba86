use crate::config::{LoadedConfig, load_config_file};
use crate::fetch::fetch_listing_page;
use crate::model::{CatalogCounts, CatalogEntry, CrawlReport, PersistFailure, PersistReport};
use crate::parser::{CatalogBatchExtractor, Extraction, collect_anchors};
use crate::store::{CatalogStore, SqliteStore};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub config_path: PathBuf,
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub config_path: PathBuf,
}

/// Opens the store, fetches the listings page, extracts entries and persists them.
///
/// The store is opened first so an unreachable database stops the run before
/// any network traffic.
pub fn crawl(options: &CrawlOptions) -> Result<CrawlReport> {
    let loaded = load_config_file(&options.config_path)?;
    let database_path = resolve_database_path(&loaded, options.database_path.as_ref())?;
    let mut store = SqliteStore::open(&database_path)?;
    info!(
        source = %loaded.config.source.key,
        database = %database_path.display(),
        "crawl start"
    );

    let extraction = extract_from_source(&loaded)?;
    let mut report = CrawlReport {
        source_key: loaded.config.source.key.clone(),
        anchors_seen: extraction.anchors_seen,
        anchors_ignored: extraction.anchors_ignored,
        entries_extracted: extraction.entries.len(),
        ..CrawlReport::default()
    };

    if extraction.entries.is_empty() {
        warn!(source = %report.source_key, "no catalog entries found on listings page");
        return Ok(report);
    }

    report.persist = persist_entries(&mut store, &extraction.entries)
        .with_context(|| format!("persist failed for source {}", report.source_key))?;

    info!(
        source = %report.source_key,
        entries = report.entries_extracted,
        processed = report.persist.entries_processed,
        brands = report.persist.brands_inserted,
        models = report.persist.models_inserted,
        years = report.persist.years_inserted,
        failures = report.persist.failures.len(),
        "crawl complete"
    );

    Ok(report)
}

pub fn extract_listings(options: &ExtractOptions) -> Result<Vec<CatalogEntry>> {
    let loaded = load_config_file(&options.config_path)?;
    Ok(extract_from_source(&loaded)?.entries)
}

pub fn catalog_stats(options: &CrawlOptions) -> Result<CatalogCounts> {
    let loaded = load_config_file(&options.config_path)?;
    let database_path = resolve_database_path(&loaded, options.database_path.as_ref())?;
    SqliteStore::open(&database_path)?.counts()
}

pub fn resolve_database_path(
    loaded: &LoadedConfig,
    override_path: Option<&PathBuf>,
) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path.clone()),
        None => loaded.database_path(),
    }
}

fn extract_from_source(loaded: &LoadedConfig) -> Result<Extraction> {
    let page = fetch_listing_page(loaded)
        .with_context(|| format!("fetch failed for source {}", loaded.config.source.key))?;
    let anchors = collect_anchors(&page.body)
        .with_context(|| format!("failed to read anchors from {}", page.source_url))?;
    let extractor = CatalogBatchExtractor::from_config(&loaded.config.catalog);
    Ok(extractor.extract_all(&anchors))
}

/// Writes entries into the Brand → Model → Year hierarchy in input order.
///
/// Brand and model are committed before the model id is looked up, and the
/// year rows for that id are committed as a second step. A storage error stops
/// the batch; everything committed before it stays. An entry that breaks a
/// catalog entry invariant, or whose model id cannot be found, is reported in
/// [`PersistReport::failures`] and skipped.
pub fn persist_entries<S>(store: &mut S, entries: &[CatalogEntry]) -> Result<PersistReport>
where
    S: CatalogStore + ?Sized,
{
    let mut known_brands = store
        .brand_names()
        .context("failed to load existing brands")?;
    let mut report = PersistReport::default();

    for entry in entries {
        if let Err(err) = persist_entry(store, entry, &mut known_brands, &mut report) {
            return Err(err.context(format!(
                "failed to persist {} ({}) after {} committed entries",
                entry.label(),
                entry.source_href,
                report.entries_processed
            )));
        }
    }

    info!(
        processed = report.entries_processed,
        rows = report.rows_inserted(),
        failures = report.failures.len(),
        "catalog entries persisted"
    );

    Ok(report)
}

fn persist_entry<S>(
    store: &mut S,
    entry: &CatalogEntry,
    known_brands: &mut BTreeSet<String>,
    report: &mut PersistReport,
) -> Result<()>
where
    S: CatalogStore + ?Sized,
{
    if let Some(reason) = entry.invalid_reason() {
        warn!(
            brand = %entry.brand,
            model = %entry.model,
            href = %entry.source_href,
            %reason,
            "invalid catalog entry; nothing written"
        );
        report.failures.push(failure(entry, reason));
        return Ok(());
    }

    if !known_brands.contains(&entry.brand) {
        info!(brand = %entry.brand, "adding new brand");
    }

    let inserted = store.insert_brand_and_model(&entry.brand, &entry.model)?;
    if inserted.brand_inserted {
        report.brands_inserted += 1;
    }
    known_brands.insert(entry.brand.clone());
    if inserted.model_inserted {
        report.models_inserted += 1;
    }

    let Some(model_id) = store.find_model_id(&entry.brand, &entry.model)? else {
        warn!(
            brand = %entry.brand,
            model = %entry.model,
            href = %entry.source_href,
            "model id missing after insert; skipping years"
        );
        report
            .failures
            .push(failure(entry, "model id not found after insert".to_string()));
        return Ok(());
    };

    report.years_inserted +=
        store.insert_years(model_id, entry.years.years(), &entry.source_href)?;
    report.entries_processed += 1;
    Ok(())
}

fn failure(entry: &CatalogEntry, reason: String) -> PersistFailure {
    PersistFailure {
        brand: entry.brand.clone(),
        model: entry.model.clone(),
        source_href: entry.source_href.clone(),
        reason,
    }
}
