//! On-disk cache for market data.

use lastro_data::{DataError, SqliteCache};
use std::path::PathBuf;

/// Get the default cache directory path.
///
/// Uses platform-specific cache directories:
/// - Linux: `~/.cache/lastro/`
/// - macOS: `~/Library/Caches/lastro/`
/// - Windows: `%LOCALAPPDATA%\lastro\`
pub(crate) fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lastro")
}

/// Get the default cache database path.
pub(crate) fn default_cache_path() -> PathBuf {
    default_cache_dir().join("lastro.db")
}

/// Open the cache, creating the directory if needed, and drop expired entries.
pub(crate) fn open_cache(ttl_secs: u64) -> Result<SqliteCache, DataError> {
    let cache = SqliteCache::new(default_cache_path())?.with_ttl_secs(ttl_secs);
    let purged = cache.purge_expired()?;
    if purged > 0 {
        tracing::debug!(purged, "dropped expired cache entries");
    }
    Ok(cache)
}

/// One-line summary of the cache, for stderr.
pub(crate) fn describe(cache: &SqliteCache) -> String {
    let path = default_cache_path();
    match cache.get_stats() {
        Ok(stats) => format!(
            "Cache: {} ({} series, {} entries)",
            path.display(),
            stats.unique_series,
            stats.entries
        ),
        Err(_) => format!("Cache: {}", path.display()),
    }
}
