//! Process-wide in-memory cache.

use super::{CacheKey, DEFAULT_TTL_SECS, SeriesCache};
use crate::error::Result;
use crate::series::DailyFactorSeries;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
    stored_at: DateTime<Utc>,
    series: DailyFactorSeries,
}

/// Thread-safe TTL cache backed by a [`DashMap`].
///
/// Clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Arc<DashMap<CacheKey, Entry>>,
    ttl: Duration,
}

impl MemoryCache {
    /// Cache with the default one-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl_secs(DEFAULT_TTL_SECS)
    }

    /// Cache with a custom TTL in seconds.
    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl: i64::try_from(ttl_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| now - entry.stored_at < ttl);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SeriesCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<DailyFactorSeries>> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if Utc::now() - entry.stored_at < self.ttl {
            return Ok(Some(entry.series.clone()));
        }
        // Release the read guard before removing.
        drop(entry);
        self.entries.remove(key);
        Ok(None)
    }

    fn put(&self, key: &CacheKey, series: &DailyFactorSeries) -> Result<()> {
        self.entries.insert(
            key.clone(),
            Entry {
                stored_at: Utc::now(),
                series: series.clone(),
            },
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
