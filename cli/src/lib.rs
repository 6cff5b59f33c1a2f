//! Wiring between the dataset cache and the search index: make sure the cache
//! is fresh, read every cached dataset, and load it into a [`CategorySearch`].

use anyhow::{bail, Result};
use clap::Args;
use designdex_cache::{
    CacheConfig, CacheFile, CacheManager, DataFormat, SyncOptions, DEFAULT_DATASET_URL, DEFAULT_PACKAGE,
    DEFAULT_REGISTRY_URL, DEFAULT_TIMEOUT_SECS,
};
use designdex_core::dataset::{records_from_csv, records_from_json};
use designdex_core::{CategorySearch, Dataset};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Cache directory [default: platform cache dir]
    #[arg(long, env = "DESIGNDEX_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
    /// Registry package that versions the dataset
    #[arg(long, env = "DESIGNDEX_PACKAGE", default_value = DEFAULT_PACKAGE)]
    pub package: String,
    /// Package registry base URL
    #[arg(long, env = "DESIGNDEX_REGISTRY", default_value = DEFAULT_REGISTRY_URL)]
    pub registry: String,
    /// Dataset download URL template ({package}, {version}, {file})
    #[arg(long, env = "DESIGNDEX_DATASET_URL", default_value = DEFAULT_DATASET_URL)]
    pub dataset_url: String,
    /// Dataset files to download, comma-separated
    #[arg(long, env = "DESIGNDEX_DATASETS", value_delimiter = ',')]
    pub datasets: Vec<String>,
    /// Format recorded in the cache metadata (csv or json)
    #[arg(long, default_value = "csv", value_parser = parse_format)]
    pub format: DataFormat,
    /// Registry request timeout in seconds
    #[arg(long, env = "DESIGNDEX_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    /// Do not contact the registry when a cache already exists
    #[arg(long, env = "DESIGNDEX_NO_AUTO_UPDATE")]
    pub no_auto_update: bool,
}

fn parse_format(s: &str) -> std::result::Result<DataFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "csv" => Ok(DataFormat::Csv),
        "json" => Ok(DataFormat::Json),
        other => Err(format!("unknown format '{other}', expected csv or json")),
    }
}

pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "designdex")
        .map_or_else(|| PathBuf::from(".designdex-cache"), |dirs| dirs.cache_dir().to_path_buf())
}

impl CacheArgs {
    pub fn to_config(&self) -> CacheConfig {
        let mut config = CacheConfig::new(self.cache_dir.clone().unwrap_or_else(default_cache_dir));
        config.package = self.package.clone();
        config.registry_url = self.registry.clone();
        config.dataset_url = self.dataset_url.clone();
        if !self.datasets.is_empty() {
            config.datasets = self.datasets.clone();
        }
        config.format = self.format;
        config.auto_update = !self.no_auto_update;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config
    }

    pub fn open(&self) -> Result<CacheManager> {
        Ok(CacheManager::new(self.to_config())?)
    }
}

/// Read every cached `.csv`/`.json` file as a dataset named after its file stem.
/// Files that cannot be read or parsed are skipped with a warning. Files sharing
/// a stem (`colors.csv`, `brand/colors.json`) are merged into one category in
/// path order.
pub fn load_datasets(cache: &CacheManager) -> Vec<Dataset> {
    let mut datasets: Vec<Dataset> = Vec::new();
    for name in cache.list_files() {
        let path = Path::new(&name);
        if !matches!(path.extension().and_then(|s| s.to_str()), Some("csv" | "json")) {
            continue;
        }
        let Some(category) = path.file_stem().and_then(|s| s.to_str()) else { continue };
        let records = match cache.read_file(&name) {
            Some(CacheFile::Json(value)) => records_from_json(value),
            Some(CacheFile::Text(text)) => match records_from_csv(&text) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "skipping unparsable dataset");
                    continue;
                }
            },
            None => {
                tracing::warn!(file = %name, "skipping unreadable dataset");
                continue;
            }
        };
        tracing::debug!(file = %name, category, records = records.len(), "read dataset");
        match datasets.iter_mut().find(|d| d.category == category) {
            Some(existing) => {
                tracing::warn!(file = %name, category, "category already loaded from another file, merging");
                existing.data.extend(records);
            }
            None => datasets.push(Dataset::new(category, records)),
        }
    }
    datasets
}

pub fn build_search(cache: &CacheManager) -> CategorySearch {
    let mut search = CategorySearch::new();
    search.load_datasets(load_datasets(cache));
    tracing::info!(categories = search.get_categories().len(), num_docs = search.num_docs(), "search index built");
    search
}

/// Sync the cache (unless `offline`) and build the search index from it.
pub async fn prepare_search(cache: &CacheManager, options: SyncOptions, offline: bool) -> Result<CategorySearch> {
    if offline {
        if !cache.has_cache() {
            bail!("no cached data in {}; run `designdex sync` first", cache.dir().display());
        }
    } else {
        let outcome = cache.ensure_fresh(options).await?;
        tracing::info!(version = outcome.version(), "dataset ready");
    }
    Ok(build_search(cache))
}
