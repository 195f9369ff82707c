//! Memo caches for geocoding and routing results.
//!
//! Negative results are cached like positive ones: an address the geocoder
//! could not find, or a pair the engine could not route, is stored as `None`
//! and never requested again. Errors are not cached. The caches are
//! unbounded, so no entry is ever evicted.

use std::future::Future;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use moka::future::Cache as MokaCache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Coord, CoordKey};

use super::engine::RouteSegment;
use super::error::CacheError;

/// Address → coordinate, `None` when the address could not be found.
pub type GeoCache = MemoCache<String, Option<Coord>>;

/// Ordered coordinate pair → walking route, `None` when unroutable.
pub type RouteCache = MemoCache<(CoordKey, CoordKey), Option<RouteSegment>>;

const GEO_FILE: &str = "geocode.json";
const ROUTE_FILE: &str = "routes.json";

/// Configuration for the memo caches.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the cache files.
    pub dir: PathBuf,

    /// Write the caches after every route table build, not only at exit.
    pub persist_after_batch: bool,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            persist_after_batch: true,
        }
    }

    pub fn geo_file(&self) -> CacheFile {
        CacheFile::new(self.dir.join(GEO_FILE))
    }

    pub fn route_file(&self) -> CacheFile {
        CacheFile::new(self.dir.join(ROUTE_FILE))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("cache")
    }
}

/// An async memo table.
///
/// Cheap to clone; clones share the same entries.
#[derive(Clone)]
pub struct MemoCache<K, V> {
    entries: MokaCache<K, V>,
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: MokaCache::builder().build(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.entries.insert(key, value).await;
    }

    /// Return the cached value, or run `compute` and cache its `Ok` result.
    ///
    /// Concurrent callers for the same key share a single computation. An
    /// `Err` is handed to every waiting caller and nothing is cached.
    pub async fn get_or_try_compute<F, E>(&self, key: K, compute: F) -> Result<V, Arc<E>>
    where
        F: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        self.entries.try_get_with(key, compute).await
    }

    /// Copy out every entry.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|(key, value)| (K::clone(&key), value))
            .collect()
    }

    pub async fn extend(&self, entries: impl IntoIterator<Item = (K, V)>) {
        for (key, value) in entries {
            self.entries.insert(key, value).await;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a persisted snapshot into the cache, returning the entry count.
    pub async fn load_from(&self, file: &CacheFile) -> usize
    where
        K: DeserializeOwned,
        V: DeserializeOwned,
    {
        let entries: Vec<(K, V)> = file.load();
        let count = entries.len();
        self.extend(entries).await;
        debug!(path = %file.path().display(), count, "cache loaded");
        count
    }

    /// Persist the cache, entries sorted by key.
    pub fn save_to(&self, file: &CacheFile) -> Result<(), CacheError>
    where
        K: Ord + Serialize,
        V: Serialize,
    {
        let mut entries = self.snapshot();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        file.save(&entries)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<K, V> {
    /// Unix timestamp when the file was written.
    saved_at_secs: u64,
    entries: Vec<Entry<K, V>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry<K, V> {
    key: K,
    value: V,
}

/// A JSON file holding one cache snapshot.
#[derive(Debug, Clone)]
pub struct CacheFile {
    path: PathBuf,
}

impl CacheFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot.
    ///
    /// A missing file is an empty cache. So is a corrupt one, with a warning.
    pub fn load<K: DeserializeOwned, V: DeserializeOwned>(&self) -> Vec<(K, V)> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str::<Snapshot<K, V>>(&contents) {
            Ok(snapshot) => snapshot
                .entries
                .into_iter()
                .map(|e| (e.key, e.value))
                .collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring corrupt cache file");
                Vec::new()
            }
        }
    }

    /// Write the snapshot, creating parent directories if needed.
    pub fn save<K: Serialize, V: Serialize>(&self, entries: &[(K, V)]) -> Result<(), CacheError> {
        let io_error = |e: std::io::Error| CacheError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let saved_at_secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let snapshot = Snapshot {
            saved_at_secs,
            entries: entries
                .iter()
                .map(|(key, value)| Entry { key, value })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| CacheError::Json {
            message: e.to_string(),
        })?;

        std::fs::write(&self.path, json).map_err(io_error)?;
        debug!(path = %self.path.display(), count = entries.len(), "cache saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn coord(lat: f64, lon: f64) -> Coord {
        Coord::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn caches_negative_results() {
        let cache = GeoCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let found = cache
                .get_or_try_compute("Nowhere 1".to_string(), async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(None)
                })
                .await
                .unwrap();
            assert_eq!(found, None);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_results_outlive_many_inserts() {
        let cache = GeoCache::default();
        cache.insert("Audimax".to_string(), None).await;
        for i in 0..5_000 {
            cache
                .insert(format!("Olshausenstr. {i}"), Some(coord(54.34, 10.12)))
                .await;
        }
        cache.entries.run_pending_tasks().await;

        assert_eq!(cache.get(&"Audimax".to_string()).await, Some(None));
        assert_eq!(cache.len(), 5_001);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache = GeoCache::new();

        let first = cache
            .get_or_try_compute("Somewhere 1".to_string(), async {
                Err::<Option<Coord>, _>("timeout".to_string())
            })
            .await;
        assert_eq!(first.unwrap_err().as_str(), "timeout");
        assert!(cache.get(&"Somewhere 1".to_string()).await.is_none());

        let second = cache
            .get_or_try_compute("Somewhere 1".to_string(), async {
                Ok::<_, String>(Some(coord(54.3, 10.1)))
            })
            .await
            .unwrap();
        assert_eq!(second, Some(coord(54.3, 10.1)));
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_computation() {
        let cache = GeoCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            async move {
                cache
                    .get_or_try_compute("Olshausenstr. 40".to_string(), async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, String>(Some(Coord::new(54.34, 10.12).unwrap()))
                    })
                    .await
            }
        });
        let results = futures::future::join_all(lookups).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let dir = tempdir().unwrap();
        let config = CacheConfig::new(dir.path().join("nested"));

        let cache = GeoCache::new();
        cache
            .insert("Olshausenstr. 40".to_string(), Some(coord(54.34, 10.12)))
            .await;
        cache.insert("Audimax".to_string(), None).await;
        cache.save_to(&config.geo_file()).unwrap();

        let reloaded = GeoCache::new();
        assert_eq!(reloaded.load_from(&config.geo_file()).await, 2);
        assert_eq!(reloaded.get(&"Audimax".to_string()).await, Some(None));
        assert_eq!(
            reloaded.get(&"Olshausenstr. 40".to_string()).await,
            Some(Some(coord(54.34, 10.12)))
        );
    }

    #[tokio::test]
    async fn route_cache_round_trips_pair_keys() {
        let dir = tempdir().unwrap();
        let file = CacheFile::new(dir.path().join("routes.json"));
        let (a, b) = (coord(54.34, 10.12), coord(54.33, 10.13));

        let cache = RouteCache::new();
        cache.insert((a.key(), b.key()), None).await;
        cache.save_to(&file).unwrap();

        let reloaded = RouteCache::new();
        reloaded.load_from(&file).await;
        assert_eq!(reloaded.get(&(a.key(), b.key())).await, Some(None));
        assert_eq!(reloaded.get(&(b.key(), a.key())).await, None);
    }

    #[test]
    fn missing_or_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let missing = CacheFile::new(dir.path().join("absent.json"));
        assert!(missing.load::<String, Option<Coord>>().is_empty());

        let corrupt_path = dir.path().join("corrupt.json");
        std::fs::write(&corrupt_path, "{ not json").unwrap();
        let corrupt = CacheFile::new(corrupt_path);
        assert!(corrupt.load::<String, Option<Coord>>().is_empty());
    }
}
