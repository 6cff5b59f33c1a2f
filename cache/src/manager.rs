use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::metadata::{CacheMetadata, METADATA_FILE};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Minimal shape of a registry "latest" document.
#[derive(Debug, Deserialize)]
struct RegistryLatest {
    version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    pub has_update: bool,
    pub current_version: Option<String>,
    pub latest_version: String,
}

/// A cached file: parsed for `.json` names, raw text for everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheFile {
    Json(serde_json::Value),
    Text(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Download even when the cached version matches the registry.
    pub force: bool,
    /// Report progress at info level instead of debug.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    UpToDate { version: String },
    Updated { previous: Option<String>, version: String, files: usize },
    /// The registry was unreachable; the existing cache is used as is.
    Offline { version: String },
}

impl SyncOutcome {
    pub fn version(&self) -> &str {
        match self {
            Self::UpToDate { version } | Self::Updated { version, .. } | Self::Offline { version } => version,
        }
    }
}

/// On-disk dataset cache reconciled against a package registry.
pub struct CacheManager {
    config: CacheConfig,
    client: Client,
}

impl CacheManager {
    /// Creates the cache directory if needed; failing to do so is fatal.
    pub fn new(config: CacheConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir).map_err(|source| CacheError::Setup { path: config.dir.clone(), source })?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CacheConfig { &self.config }

    pub fn dir(&self) -> &Path { &self.config.dir }

    fn metadata_path(&self) -> PathBuf { self.config.dir.join(METADATA_FILE) }

    /// The cached metadata, or `None` when it is missing or unreadable.
    pub fn metadata(&self) -> Option<CacheMetadata> {
        let path = self.metadata_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cache metadata");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparsable cache metadata");
                None
            }
        }
    }

    pub fn has_cache(&self) -> bool { self.metadata().is_some() }

    /// Replace `metadata.json` via a temp file + rename so readers never see a partial write.
    pub fn write_metadata(&self, meta: &CacheMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(meta)?;
        let mut tmp = NamedTempFile::new_in(&self.config.dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.metadata_path()).map_err(|e| e.error)?;
        Ok(())
    }

    pub async fn latest_version(&self) -> Result<String> {
        let url = self.config.latest_url();
        debug!(%url, "checking registry");
        let resp = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(CacheError::Registry { status: resp.status().as_u16(), url });
        }
        let latest: RegistryLatest = resp.json().await?;
        let version = latest.version.trim();
        if version.is_empty() {
            return Err(CacheError::InvalidResponse(format!("empty version from {url}")));
        }
        Ok(version.to_string())
    }

    /// Exact string comparison between the cached and published version.
    pub async fn check_update(&self) -> Result<UpdateCheck> {
        let latest_version = self.latest_version().await?;
        Ok(match self.metadata() {
            None => UpdateCheck { has_update: true, current_version: None, latest_version },
            Some(meta) => UpdateCheck {
                has_update: meta.version != latest_version,
                current_version: Some(meta.version),
                latest_version,
            },
        })
    }

    pub fn read_file(&self, name: &str) -> Option<CacheFile> {
        let Some(rel) = relative_path(name) else {
            warn!(name, "rejecting cache path outside the cache directory");
            return None;
        };
        let path = self.config.dir.join(rel);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read cached file");
                return None;
            }
        };
        if !name.ends_with(".json") {
            return Some(CacheFile::Text(raw));
        }
        match serde_json::from_str(&raw) {
            Ok(value) => Some(CacheFile::Json(value)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cached JSON file is corrupt");
                None
            }
        }
    }

    /// Cached files relative to the cache root, `/`-separated and sorted.
    /// Metadata and hidden entries (in-flight syncs, temp files) are left out.
    pub fn list_files(&self) -> Vec<String> {
        let root = &self.config.dir;
        let mut files: Vec<String> = WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let rel = e.path().strip_prefix(root).ok()?;
                let rel = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                (rel != METADATA_FILE).then_some(rel)
            })
            .collect();
        files.sort();
        files
    }

    pub fn clear(&self) -> Result<()> {
        let dir = &self.config.dir;
        match fs::remove_dir_all(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(dir).map_err(|source| CacheError::Setup { path: dir.clone(), source })?;
        info!(dir = %dir.display(), "cache cleared");
        Ok(())
    }

    /// Download the published datasets when the registry has a newer version
    /// (or always, with `force`). Files are staged first and only moved into
    /// place once every download succeeded, so a failed sync leaves the
    /// previous cache intact. After a successful sync only the configured
    /// datasets remain in the cache.
    pub async fn sync(&self, options: SyncOptions) -> Result<SyncOutcome> {
        let check = self.check_update().await?;
        if !check.has_update && !options.force {
            report(options.verbose, &format!("cache is up to date at {}", check.latest_version));
            return Ok(SyncOutcome::UpToDate { version: check.latest_version });
        }

        let version = check.latest_version;
        let current = check.current_version.as_deref().unwrap_or("none");
        report(options.verbose, &format!("syncing {} {current} -> {version}", self.config.package));

        let mut files = Vec::with_capacity(self.config.datasets.len());
        for name in &self.config.datasets {
            let rel = relative_path(name).ok_or_else(|| CacheError::InvalidPath(name.clone()))?;
            files.push(rel);
        }

        let staging = tempfile::Builder::new().prefix(".sync-").tempdir_in(&self.config.dir)?;
        for (name, rel) in self.config.datasets.iter().zip(&files) {
            let url = self.config.dataset_file_url(&version, name);
            let bytes = self.download(&url).await?;
            let target = staging.path().join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &bytes)?;
            report(options.verbose, &format!("fetched {name} ({} bytes)", bytes.len()));
        }

        for rel in &files {
            let dest = self.config.dir.join(rel);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(staging.path().join(rel), &dest)?;
        }
        self.remove_stale_files(&files);
        let meta = CacheMetadata::new(version.clone(), self.config.package.clone(), self.config.format);
        self.write_metadata(&meta)?;

        info!(version = %version, files = files.len(), "cache synced");
        Ok(SyncOutcome::Updated { previous: check.current_version, version, files: files.len() })
    }

    /// Make sure a usable cache exists before loading it.
    ///
    /// Skips the network when auto-update is off and a cache is present, and
    /// falls back to the existing cache when the registry cannot be reached.
    pub async fn ensure_fresh(&self, options: SyncOptions) -> Result<SyncOutcome> {
        if !self.config.auto_update && !options.force {
            if let Some(meta) = self.metadata() {
                debug!(version = %meta.version, "auto-update disabled, using cached data");
                return Ok(SyncOutcome::UpToDate { version: meta.version });
            }
        }
        match self.sync(options).await {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_network() => match self.metadata() {
                Some(meta) => {
                    warn!(error = %err, version = %meta.version, "update check failed, using cached data");
                    Ok(SyncOutcome::Offline { version: meta.version })
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Delete cached files that the synced dataset list no longer names, so a
    /// dropped dataset (or the other format's copy) is not loaded later.
    fn remove_stale_files(&self, keep: &[&Path]) {
        for name in self.list_files() {
            if keep.iter().any(|rel| *rel == Path::new(&name)) {
                continue;
            }
            match fs::remove_file(self.config.dir.join(&name)) {
                Ok(()) => debug!(file = %name, "removed stale cached file"),
                Err(e) => warn!(file = %name, error = %e, "failed to remove stale cached file"),
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(CacheError::Registry { status: resp.status().as_u16(), url: url.to_string() });
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

fn report(verbose: bool, message: &str) {
    if verbose {
        info!("{message}");
    } else {
        debug!("{message}");
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|s| s.starts_with('.'))
}

/// Only plain relative paths stay inside the cache directory.
fn relative_path(name: &str) -> Option<&Path> {
    let path = Path::new(name);
    let plain = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    plain.then_some(path)
}
