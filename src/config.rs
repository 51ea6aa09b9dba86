use crate::model::{MIN_VALID_YEAR, YearBounds};
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: CatalogConfig,
}

impl LoadedConfig {
    pub fn database_path(&self) -> Result<PathBuf> {
        resolve_path(&self.path, &self.config.store.database_path)
    }

    pub fn page_file_path(&self) -> Result<PathBuf> {
        let file_path = self
            .config
            .fetch
            .file_path
            .as_ref()
            .context("fetch.file_path missing for file mode")?;
        resolve_path(&self.path, file_path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub source: SourceMeta,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub catalog: VocabularyConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source.key.trim().is_empty() {
            bail!("source.key must not be empty");
        }
        Url::parse(&self.source.page_url).with_context(|| {
            format!("source.page_url is not a valid url: {}", self.source.page_url)
        })?;

        if self.fetch.mode == FetchMode::File && self.fetch.file_path.is_none() {
            bail!("fetch.file_path is required for file mode");
        }

        if self.catalog.brands.is_empty() {
            bail!("catalog.brands must not be empty");
        }
        if let Some(blank) = self.catalog.brands.iter().position(|b| b.trim().is_empty()) {
            bail!("catalog.brands[{blank}] must not be blank");
        }

        let bounds = self.catalog.year_bounds();
        if bounds.min > bounds.max {
            bail!(
                "catalog.min_year ({}) must not exceed catalog.max_year ({})",
                bounds.min,
                bounds.max
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceMeta {
    pub key: String,
    pub page_url: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    #[default]
    Http,
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub mode: FetchMode,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Http,
            file_path: None,
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

/// How a listing that mentions several vocabulary brands is attributed.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BrandMatchPolicy {
    /// Every matching brand is applied in vocabulary order; the last one sticks.
    #[default]
    LastWins,
    FirstWins,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyConfig {
    pub brands: Vec<String>,
    #[serde(default)]
    pub ignored_hrefs: BTreeSet<String>,
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default)]
    pub max_year: Option<i32>,
    #[serde(default)]
    pub brand_match: BrandMatchPolicy,
}

impl VocabularyConfig {
    pub fn year_bounds(&self) -> YearBounds {
        let current = YearBounds::current();
        YearBounds::new(self.min_year, self.max_year.unwrap_or(current.max))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

pub fn load_config_file(config_path: &Path) -> Result<LoadedConfig> {
    let text = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read catalog config: {}", config_path.display()))?;
    let config: CatalogConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse toml in {}", config_path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid catalog config {}", config_path.display()))?;
    Ok(LoadedConfig {
        path: config_path.to_path_buf(),
        config,
    })
}

pub fn resolve_path(base_config_path: &Path, maybe_relative: &Path) -> Result<PathBuf> {
    if maybe_relative.is_absolute() {
        return Ok(maybe_relative.to_path_buf());
    }

    let parent = base_config_path.parent().ok_or_else(|| {
        anyhow!(
            "catalog config has no parent directory: {}",
            base_config_path.display()
        )
    })?;

    Ok(parent.join(maybe_relative))
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_min_year() -> i32 {
    MIN_VALID_YEAR
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/catalog.sqlite")
}
