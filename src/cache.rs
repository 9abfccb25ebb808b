//! Fingerprint-keyed result cache with per-entry TTL.
//!
//! Values are deterministic functions of immutable inputs, so staleness is
//! bounded by TTL alone and get/put only need per-slot atomicity. Concurrent
//! resolutions of the same fingerprint are not deduplicated; whichever
//! finishes last owns the slot.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::share::ResolutionResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ResolutionResult,
    expires_at: Instant,
}

/// In-memory TTL cache over [`ResolutionResult`]s.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result for `fingerprint` if present and unexpired.
    ///
    /// Expired entries are removed on access.
    #[must_use]
    pub fn get(&self, fingerprint: &str) -> Option<ResolutionResult> {
        let expired = match self.entries.get(fingerprint) {
            Some(entry) if Instant::now() < entry.expires_at => {
                debug!(fingerprint, "cache hit");
                return Some(entry.result.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(fingerprint);
            debug!(fingerprint, "cache entry expired");
        }
        None
    }

    /// Stores `result` under `fingerprint` for `ttl_seconds`.
    ///
    /// A zero TTL means "do not cache": the entry is not stored (and any
    /// stale entry for the same slot is dropped).
    pub fn put(&self, fingerprint: &str, result: ResolutionResult, ttl_seconds: u64) {
        if ttl_seconds == 0 {
            self.entries.remove(fingerprint);
            return;
        }
        debug!(fingerprint, ttl_seconds, "cache store");
        self.entries.insert(
            fingerprint.to_string(),
            CacheEntry {
                result,
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
    }

    /// Drops every entry.
    pub fn flush(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, counting any not-yet-purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::share::unix_now;

    fn sample_result(share_id: &str) -> ResolutionResult {
        ResolutionResult {
            provider: "lanzou".to_string(),
            share_id: share_id.to_string(),
            file_name: "w.zip".to_string(),
            file_size: "920.1 KB".to_string(),
            file_type: "压缩文件".to_string(),
            upload_time: "2024-01-01".to_string(),
            uploader: String::new(),
            download_url: "https://cdn.example.com/file/abc?fn=w.zip".to_string(),
            resolved_at: unix_now(),
        }
    }

    #[test]
    fn test_get_returns_stored_result_within_ttl() {
        let cache = ResultCache::new();
        cache.put("lanzou:abc:", sample_result("abc"), 60);
        let hit = cache.get("lanzou:abc:").unwrap();
        assert_eq!(hit.file_name, "w.zip");
    }

    #[test]
    fn test_get_misses_unknown_fingerprint() {
        let cache = ResultCache::new();
        assert!(cache.get("lanzou:missing:").is_none());
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let cache = ResultCache::new();
        cache.put("lanzou:abc:", sample_result("abc"), 0);
        assert!(cache.get("lanzou:abc:").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_evicts_previous_entry() {
        let cache = ResultCache::new();
        cache.put("lanzou:abc:", sample_result("abc"), 60);
        cache.put("lanzou:abc:", sample_result("abc"), 0);
        assert!(cache.get("lanzou:abc:").is_none());
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = ResultCache::new();
        cache.put("lanzou:abc:", sample_result("abc"), 1);
        assert!(cache.get("lanzou:abc:").is_some());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get("lanzou:abc:").is_none());
        assert!(cache.is_empty(), "expired entry must be purged on access");
    }

    #[test]
    fn test_flush_clears_everything() {
        let cache = ResultCache::new();
        cache.put("a:1:", sample_result("1"), 60);
        cache.put("a:2:", sample_result("2"), 60);
        assert_eq!(cache.len(), 2);
        cache.flush();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins_for_same_fingerprint() {
        let cache = ResultCache::new();
        let mut second = sample_result("abc");
        second.download_url = "https://cdn.example.com/file/def".to_string();
        cache.put("lanzou:abc:", sample_result("abc"), 60);
        cache.put("lanzou:abc:", second.clone(), 60);
        assert_eq!(cache.get("lanzou:abc:").unwrap(), second);
    }
}
