//! External market data sources.
//!
//! Sources return raw observations and surface every failure as a
//! [`DataError`](crate::DataError); turning failures into empty series is the
//! gateway's job.

pub mod bcb;
pub mod fixed;
pub mod yahoo;

pub use bcb::{BcbRateSource, rates_to_factors};
pub use fixed::{FixedPriceSource, FixedRateSource};
pub use yahoo::YahooPriceSource;

use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// A dated numeric value from an external source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Observation date
    pub date: NaiveDate,
    /// Raw value: a percentage rate or a closing price
    pub value: f64,
}

impl Observation {
    /// Create an observation.
    pub const fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Short-term interest-rate index, queried by date range.
///
/// Values are percentages as published, either daily or annualized.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch rate observations in `[start, end]`.
    async fn fetch_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>>;
}

/// Daily closing prices for a symbol, queried by date range.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch adjusted closes in `[start, end]`.
    async fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>>;
}
