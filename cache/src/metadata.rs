use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Csv,
    Json,
}

/// What is currently cached; written once per successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub synced_at: OffsetDateTime,
    pub source: String,
    pub format: DataFormat,
}

impl CacheMetadata {
    pub fn new(version: impl Into<String>, source: impl Into<String>, format: DataFormat) -> Self {
        Self { version: version.into(), synced_at: OffsetDateTime::now_utc(), source: source.into(), format }
    }
}
