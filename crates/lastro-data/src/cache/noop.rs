//! Cache that stores nothing.

use super::{CacheKey, SeriesCache};
use crate::error::Result;
use crate::series::DailyFactorSeries;

/// Cache that never hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl SeriesCache for NoopCache {
    fn get(&self, _key: &CacheKey) -> Result<Option<DailyFactorSeries>> {
        Ok(None)
    }

    fn put(&self, _key: &CacheKey, _series: &DailyFactorSeries) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}
