//! Result caching with expiry and hash-based keys.
//!
//! Analysis results are keyed by a BLAKE3 hash of the operation name and
//! its parameters (instrument, date range, settings), so two identical
//! requests share one cached entry until it expires. `MemoryCache` lives for
//! one process; `FileCache` keeps one JSON file per key so results survive
//! across CLI runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default time-to-live for cached results.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Key/value store with per-entry expiry. Shared across worker threads.
pub trait ResultCache: Send + Sync {
    /// Cached value, `None` when absent or expired.
    fn get(&self, key: &str) -> Option<String>;

    fn set_with_ttl(&self, key: &str, value: String, ttl: Duration);
}

/// Deterministic cache key for an operation and its parameters.
pub fn cache_key<P: Serialize + ?Sized>(operation: &str, params: &P) -> Result<String, serde_json::Error> {
    let params = serde_json::to_string(params)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(operation.as_bytes());
    hasher.update(&[0]);
    hasher.update(params.as_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}

/// In-process cache. Expired entries are evicted on read, and every write
/// drops whatever else has expired.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry and return how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>> {
        // A panic while holding the lock leaves the map itself intact.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value, now + ttl));
    }
}

// ─── File-backed cache ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    key: String,
    /// Unix milliseconds.
    expires_at: i64,
    value: String,
}

/// One `<hash>.json` file per key in a cache directory.
///
/// I/O failures are logged and treated as misses; a broken cache never
/// fails an analysis.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", blake3::hash(key.as_bytes()).to_hex()))
    }

    fn read_entry(path: &Path) -> Option<FileEntry> {
        let text = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&text) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache file");
                None
            }
        }
    }

    /// Delete every expired or unreadable entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(dir) = std::fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = now_millis();
        let mut removed = 0;
        for path in dir.filter_map(|e| e.ok()).map(|e| e.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = Self::read_entry(&path).map_or(true, |e| e.expires_at <= now);
            if stale && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

impl ResultCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        let entry = Self::read_entry(&path)?;
        if entry.key != key {
            return None;
        }
        if entry.expires_at <= now_millis() {
            debug!(path = %path.display(), "cache file expired");
            let _ = std::fs::remove_file(&path);
            return None;
        }
        Some(entry.value)
    }

    fn set_with_ttl(&self, key: &str, value: String, ttl: Duration) {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let entry = FileEntry {
            key: key.to_string(),
            expires_at: now_millis().saturating_add(ttl_ms),
            value,
        };
        let path = self.path_for(key);
        let result = std::fs::create_dir_all(&self.dir)
            .and_then(|_| serde_json::to_string(&entry).map_err(std::io::Error::from))
            .and_then(|json| std::fs::write(&path, json));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "failed to write cache file");
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl ResultCache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set_with_ttl(&self, _key: &str, _value: String, _ttl: Duration) {}
}
