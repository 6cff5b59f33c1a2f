use crate::metadata::DataFormat;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PACKAGE: &str = "designdex-data";
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";
pub const DEFAULT_DATASET_URL: &str = "https://unpkg.com/{package}@{version}/data/{file}";
pub const DEFAULT_DATASETS: &[&str] = &["colors.csv", "icons.csv", "components.csv", "styles.csv"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// Registry package whose published versions track the dataset.
    pub package: String,
    pub registry_url: String,
    /// Template with `{package}`, `{version}` and `{file}` placeholders.
    pub dataset_url: String,
    pub datasets: Vec<String>,
    pub format: DataFormat,
    pub auto_update: bool,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            package: DEFAULT_PACKAGE.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            datasets: DEFAULT_DATASETS.iter().map(|s| s.to_string()).collect(),
            format: DataFormat::Csv,
            auto_update: true,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("designdex/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn latest_url(&self) -> String {
        format!("{}/{}/latest", self.registry_url.trim_end_matches('/'), self.package.replace('/', "%2F"))
    }

    pub fn dataset_file_url(&self, version: &str, file: &str) -> String {
        self.dataset_url
            .replace("{package}", &self.package)
            .replace("{version}", version)
            .replace("{file}", file)
    }
}
