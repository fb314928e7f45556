//! File-backed response cache.
//!
//! Entries never expire: a cached response is served until the cache
//! directory is cleared. Files are written to a temporary name and renamed
//! into place so a failed or concurrent write is never seen as a hit.

use crate::error::{ArmoryError, Result};
use crate::region::{Region, RegionRouter};
use crate::transport::Transport;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Longest file name written verbatim; longer names are replaced by a digest
pub const MAX_FILE_NAME_BYTES: usize = 200;

/// Keep the endpoint readable and swap an over-long query for its SHA-256
fn bounded_file_name(name: &str) -> String {
    if name.len() <= MAX_FILE_NAME_BYTES {
        return name.to_string();
    }
    let endpoint = name.split('?').next().unwrap_or_default();
    format!("{}.{:x}", endpoint, Sha256::digest(name.as_bytes()))
}

/// Ensure a directory exists, creating it if necessary
pub(crate) async fn ensure_dir(path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    if tokio::fs::metadata(path).await.is_err() {
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Remove a cache directory and everything below it. A missing directory is fine.
pub async fn clear_cache(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!("Cleared cache at {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Cache store in front of the transport
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    router: RegionRouter,
    transport: Transport,
    strict_writes: bool,
}

impl CacheStore {
    pub fn new(
        root: impl Into<PathBuf>,
        router: RegionRouter,
        transport: Transport,
        strict_writes: bool,
    ) -> Self {
        Self {
            root: root.into(),
            router,
            transport,
            strict_writes,
        }
    }

    /// Get the root directory of this cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the response for `url` is stored
    pub fn cache_path(&self, url: &str) -> Result<PathBuf> {
        let relative = self.router.region_prefix(url)?;
        let path = match relative.rsplit_once('/') {
            Some((dir, name)) => self.root.join(dir).join(bounded_file_name(name)),
            None => self.root.join(bounded_file_name(&relative)),
        };
        Ok(path)
    }

    /// Fetch `url`, going through the cache when `use_cache` is set.
    ///
    /// A hit returns the stored bytes without touching the network. Any
    /// unreadable entry counts as a miss. A miss makes exactly one transport call and then persists the body. When
    /// persisting fails the body is still returned, unless strict writes are
    /// configured, in which case [`ArmoryError::CacheWrite`] carries it.
    pub async fn fetch(&self, url: &str, use_cache: bool) -> Result<Vec<u8>> {
        if !use_cache {
            return self.transport.http_get(url).await;
        }

        let path = self.cache_path(url)?;

        match tokio::fs::read(&path).await {
            Ok(body) => {
                debug!("Cache hit for {}", url);
                return Ok(body);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss for {}", url);
            }
            Err(e) => {
                warn!("Unreadable cache entry {:?}, refetching: {}", path, e);
            }
        }

        let body = self.transport.http_get(url).await?;

        match self.persist(&path, &body).await {
            Ok(()) => Ok(body),
            Err(source) if self.strict_writes => Err(ArmoryError::CacheWrite { source, body }),
            Err(source) => {
                warn!("Failed to write cache entry {:?}: {}", path, source);
                Ok(body)
            }
        }
    }

    async fn persist(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        for region in [Region::US, Region::EU] {
            ensure_dir(self.root.join(region.as_str())).await?;
        }
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = path.with_file_name(format!(
            ".{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        trace!("Writing {} bytes to cache: {:?}", data.len(), path);

        let write_result = async {
            tokio::fs::write(&temp_path, data).await?;
            tokio::fs::rename(&temp_path, path).await
        }
        .await;

        if write_result.is_err() {
            let _ = tokio::fs::remove_file(&temp_path).await;
        }

        write_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RetryPolicy;
    use crate::{DEFAULT_EU_BASE_URL, DEFAULT_US_BASE_URL};
    use std::time::Duration;
    use tempfile::TempDir;

    fn store(root: &Path) -> CacheStore {
        let transport =
            Transport::new("test-agent", Duration::from_secs(1), RetryPolicy::none()).unwrap();
        CacheStore::new(
            root,
            RegionRouter::new(DEFAULT_US_BASE_URL, DEFAULT_EU_BASE_URL),
            transport,
            false,
        )
    }

    fn entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_cache_paths_are_deterministic_and_partitioned() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());

        let us = format!("{}guild-info.xml?n=Exodus&r=Stormrage", DEFAULT_US_BASE_URL);
        let eu = format!("{}guild-info.xml?n=Exodus&r=Stormrage", DEFAULT_EU_BASE_URL);

        assert_eq!(store.cache_path(&us).unwrap(), store.cache_path(&us).unwrap());
        assert_eq!(
            store.cache_path(&us).unwrap(),
            temp_dir.path().join("us/guild-info.xml?n=Exodus&r=Stormrage")
        );
        assert_ne!(store.cache_path(&us).unwrap(), store.cache_path(&eu).unwrap());
    }

    #[test]
    fn test_long_file_names_are_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());

        let long = format!(
            "{}team-info.xml?t={}&r=Stormrage&ts=5",
            DEFAULT_US_BASE_URL,
            "%D0%96".repeat(60)
        );
        let other = long.replace("ts=5", "ts=3");

        let path = store.cache_path(&long).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.len() <= MAX_FILE_NAME_BYTES);
        assert!(name.starts_with("team-info.xml."));
        assert_eq!(path.parent().unwrap(), temp_dir.path().join("us"));
        assert_eq!(path, store.cache_path(&long).unwrap());
        assert_ne!(path, store.cache_path(&other).unwrap());
    }

    #[tokio::test]
    async fn test_cache_hit_reads_stored_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let url = format!("{}item-info.xml?i=1", DEFAULT_US_BASE_URL);

        let path = store.cache_path(&url).unwrap();
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"<page/>").await.unwrap();

        // The host is unreachable from tests, so this can only succeed from disk
        let body = store.fetch(&url, true).await.unwrap();
        assert_eq!(body, b"<page/>");
    }

    #[tokio::test]
    async fn test_persist_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let path = store
            .cache_path(&format!("{}item-tooltip.xml?i=2", DEFAULT_EU_BASE_URL))
            .unwrap();

        store.persist(&path, b"<page/>").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"<page/>");
        assert!(temp_dir.path().join("us").is_dir());
        assert_eq!(entries(&temp_dir.path().join("eu")).len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failure_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(temp_dir.path());
        let path = store
            .cache_path(&format!("{}item-info.xml?i=3", DEFAULT_US_BASE_URL))
            .unwrap();

        // A directory where the entry belongs makes the rename fail
        std::fs::create_dir_all(&path).unwrap();
        assert!(store.persist(&path, b"<page/>").await.is_err());

        let names = entries(&temp_dir.path().join("us"));
        assert_eq!(names, vec!["item-info.xml?i=3".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_cache_missing_directory_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        clear_cache(temp_dir.path().join("never-created")).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_cache_removes_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("cache");
        ensure_dir(root.join("us")).await.unwrap();
        tokio::fs::write(root.join("us/search.xml"), b"x").await.unwrap();

        clear_cache(&root).await.unwrap();
        assert!(!root.exists());
    }
}
