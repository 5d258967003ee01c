//! Caching layer for factor series.
//!
//! The gateway takes its cache as an `Arc<dyn SeriesCache>`: [`MemoryCache`]
//! for a long-lived process, [`SqliteCache`] to persist across CLI runs and
//! [`NoopCache`] when every call must hit the sources.

pub mod memory;
pub mod noop;
pub mod sqlite;

pub use memory::MemoryCache;
pub use noop::NoopCache;
pub use sqlite::{CacheStats, SqliteCache};

use crate::error::Result;
use crate::series::DailyFactorSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default time-to-live for cached series, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Cache key: series identifier plus the requested range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Series identifier, e.g. `"rate:12"` or `"ticker:BOVA11.SA"`
    pub series: String,
    /// First requested day
    pub start: NaiveDate,
    /// Last requested day
    pub end: NaiveDate,
}

impl CacheKey {
    /// Create a key.
    pub fn new(series: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            series: series.into(),
            start,
            end,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}..{}]", self.series, self.start, self.end)
    }
}

/// Time-bounded store of factor series.
///
/// Entries older than the implementation's TTL are treated as absent.
/// Concurrent writers to the same key race; the last write wins.
pub trait SeriesCache: Send + Sync + fmt::Debug {
    /// Fetch a live entry.
    fn get(&self, key: &CacheKey) -> Result<Option<DailyFactorSeries>>;

    /// Store an entry, replacing any previous one.
    fn put(&self, key: &CacheKey, series: &DailyFactorSeries) -> Result<()>;

    /// Drop every entry.
    fn clear(&self) -> Result<()>;
}
