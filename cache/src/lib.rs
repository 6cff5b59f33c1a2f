//! Local dataset cache kept in sync with the versions published to a package registry.

mod config;
mod error;
mod manager;
mod metadata;

pub use config::{
    CacheConfig, DEFAULT_DATASETS, DEFAULT_DATASET_URL, DEFAULT_PACKAGE, DEFAULT_REGISTRY_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::{CacheError, Result};
pub use manager::{CacheFile, CacheManager, SyncOptions, SyncOutcome, UpdateCheck};
pub use metadata::{CacheMetadata, DataFormat, METADATA_FILE};
