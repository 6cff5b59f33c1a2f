use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache directory {path} could not be created: {source}")]
    Setup { path: PathBuf, source: std::io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("registry returned HTTP {status} for {url}")]
    Registry { status: u16, url: String },

    #[error("invalid registry response: {0}")]
    InvalidResponse(String),

    #[error("invalid cache path: {0}")]
    InvalidPath(String),

    #[error("metadata serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CacheError {
    /// Errors from talking to the registry or dataset host rather than local storage.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Registry { .. } | Self::InvalidResponse(_))
    }
}
