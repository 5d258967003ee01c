//! SQLite caching layer for factor series.

use super::{CacheKey, DEFAULT_TTL_SECS, SeriesCache};
use crate::error::{DataError, Result};
use crate::series::DailyFactorSeries;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// SQLite cache for factor series.
///
/// The connection sits behind a mutex so the cache can be shared through an
/// `Arc<dyn SeriesCache>`.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteCache {
    /// Create a new SQLite cache, creating the parent directory if needed.
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let cache = Self {
            conn: Mutex::new(conn),
            ttl: Duration::seconds(DEFAULT_TTL_SECS as i64),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Replace the entry time-to-live.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        self
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS factor_series (
                series_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                data TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (series_id, start_date, end_date)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_factor_series_id ON factor_series(series_id)",
            [],
        )?;

        Ok(())
    }

    /// Clear cached data for one series id, across all ranges.
    pub fn clear_series(&self, series_id: &str) -> Result<usize> {
        let removed = self.conn.lock().execute(
            "DELETE FROM factor_series WHERE series_id = ?1",
            params![series_id],
        )?;
        Ok(removed)
    }

    /// Delete entries older than the TTL.
    ///
    /// A TTL reaching past the representable date range expires nothing.
    pub fn purge_expired(&self) -> Result<usize> {
        let Some(cutoff) = Utc::now().checked_sub_signed(self.ttl) else {
            return Ok(0);
        };
        let cutoff = cutoff.to_rfc3339();
        let removed = self.conn.lock().execute(
            "DELETE FROM factor_series WHERE cached_at < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }

    /// Get cache statistics.
    pub fn get_stats(&self) -> Result<CacheStats> {
        let conn = self.conn.lock();
        let entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM factor_series", [], |row| row.get(0))?;

        let unique_series: i64 = conn.query_row(
            "SELECT COUNT(DISTINCT series_id) FROM factor_series",
            [],
            |row| row.get(0),
        )?;

        let observations: i64 = conn.query_row(
            "SELECT COALESCE(SUM(json_array_length(data)), 0) FROM factor_series",
            [],
            |row| row.get(0),
        )?;

        let oldest: Option<String> = conn.query_row(
            "SELECT MIN(cached_at) FROM factor_series",
            [],
            |row| row.get(0),
        )?;

        Ok(CacheStats {
            entries: entries as usize,
            unique_series: unique_series as usize,
            observations: observations as usize,
            oldest_entry: oldest.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

impl SeriesCache for SqliteCache {
    fn get(&self, key: &CacheKey) -> Result<Option<DailyFactorSeries>> {
        let conn = self.conn.lock();
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT data, cached_at FROM factor_series
                 WHERE series_id = ?1 AND start_date = ?2 AND end_date = ?3",
                params![key.series, key.start.to_string(), key.end.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((data, cached_at)) = row else {
            return Ok(None);
        };

        if Utc::now().signed_duration_since(parse_timestamp(&cached_at)?) >= self.ttl {
            conn.execute(
                "DELETE FROM factor_series
                 WHERE series_id = ?1 AND start_date = ?2 AND end_date = ?3",
                params![key.series, key.start.to_string(), key.end.to_string()],
            )?;
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&data)?))
    }

    fn put(&self, key: &CacheKey, series: &DailyFactorSeries) -> Result<()> {
        let data = serde_json::to_string(series)?;
        let cached_at = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT OR REPLACE INTO factor_series (series_id, start_date, end_date, data, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                key.series,
                key.start.to_string(),
                key.end.to_string(),
                data,
                cached_at
            ],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn.lock().execute("DELETE FROM factor_series", [])?;
        Ok(())
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DataError::Cache(format!("bad cached_at {text:?}: {e}")))
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached (series, range) entries
    pub entries: usize,
    /// Number of distinct series ids
    pub unique_series: usize,
    /// Total factor observations stored
    pub observations: usize,
    /// When the oldest entry was written
    pub oldest_entry: Option<DateTime<Utc>>,
}
