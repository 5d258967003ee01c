//! Market data gateway.
//!
//! Single entry point for factor series. Each request goes cache, then
//! source; failures are logged and come back as empty series tagged
//! [`SeriesOrigin::Missing`], never as errors.

use crate::cache::{CacheKey, SeriesCache};
use crate::config::GatewayConfig;
use crate::error::{DataError, Result};
use crate::series::DailyFactorSeries;
use crate::sources::{BcbRateSource, PriceSource, RateSource, YahooPriceSource, rates_to_factors};
use crate::synthetic::synthetic_rate_series;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifier of a factor series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesId {
    /// The risk-free (CDI) rate series
    RiskFree,
    /// A listed symbol
    Ticker(String),
}

impl SeriesId {
    /// Ticker id.
    pub fn ticker(symbol: impl Into<String>) -> Self {
        Self::Ticker(symbol.into())
    }

    fn cache_id(&self, config: &GatewayConfig) -> String {
        match self {
            Self::RiskFree => format!("rate:sgs.{}", config.sgs_series_code),
            Self::Ticker(symbol) => format!("ticker:{symbol}"),
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RiskFree => write!(f, "CDI"),
            Self::Ticker(symbol) => write!(f, "{symbol}"),
        }
    }
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrigin {
    /// Served from the cache
    Cache,
    /// Fetched from the external source
    Market,
    /// Generated from the synthetic annual rate
    Synthetic,
    /// Risk-free series scaled by a proxy's fallback multiplier
    RateFallback,
    /// Nothing available; the series is empty
    Missing,
}

impl SeriesOrigin {
    /// Whether the data reflects the requested instrument itself.
    pub const fn is_observed(self) -> bool {
        matches!(self, Self::Cache | Self::Market)
    }
}

/// A series tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedSeries {
    /// The data
    pub series: DailyFactorSeries,
    /// Where it came from
    pub origin: SeriesOrigin,
}

impl SourcedSeries {
    /// Tag a series.
    pub const fn new(series: DailyFactorSeries, origin: SeriesOrigin) -> Self {
        Self { series, origin }
    }

    /// Empty series tagged [`SeriesOrigin::Missing`].
    pub const fn missing() -> Self {
        Self::new(DailyFactorSeries::empty(), SeriesOrigin::Missing)
    }
}

/// Cached access to rate and price sources.
pub struct MarketDataGateway {
    rates: Arc<dyn RateSource>,
    prices: Arc<dyn PriceSource>,
    cache: Arc<dyn SeriesCache>,
    config: GatewayConfig,
}

impl fmt::Debug for MarketDataGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketDataGateway")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MarketDataGateway {
    /// Build a gateway from explicit sources and cache.
    pub fn new(
        rates: Arc<dyn RateSource>,
        prices: Arc<dyn PriceSource>,
        cache: Arc<dyn SeriesCache>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            rates,
            prices,
            cache,
            config,
        }
    }

    /// Build a gateway on the BCB and Yahoo Finance sources.
    pub fn connect(config: GatewayConfig, cache: Arc<dyn SeriesCache>) -> Result<Self> {
        let rates = Arc::new(BcbRateSource::new(&config)?);
        let prices = Arc::new(YahooPriceSource::new(&config)?);
        Ok(Self::new(rates, prices, cache, config))
    }

    /// Gateway settings.
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The cache in use.
    pub fn cache(&self) -> &Arc<dyn SeriesCache> {
        &self.cache
    }

    /// Daily factors for `id` over `[start, end]`; empty when unavailable.
    pub async fn daily_factors(
        &self,
        id: &SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DailyFactorSeries {
        self.fetch(id, start, end).await.series
    }

    /// Risk-free factors, falling back to the synthetic rate when the source
    /// yields nothing.
    pub async fn risk_free(&self, start: NaiveDate, end: NaiveDate) -> SourcedSeries {
        let fetched = self.fetch(&SeriesId::RiskFree, start, end).await;
        if !fetched.series.is_empty() {
            return fetched;
        }
        warn!(
            rate = self.config.synthetic_annual_rate,
            "risk-free series unavailable, using synthetic rate"
        );
        SourcedSeries::new(
            synthetic_rate_series(start, end, self.config.synthetic_annual_rate),
            SeriesOrigin::Synthetic,
        )
    }

    /// Ticker factors; empty and [`SeriesOrigin::Missing`] when unavailable.
    pub async fn ticker(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> SourcedSeries {
        self.fetch(&SeriesId::ticker(symbol), start, end).await
    }

    /// Cache lookup, then source download. Only non-empty downloads are cached.
    pub async fn fetch(&self, id: &SeriesId, start: NaiveDate, end: NaiveDate) -> SourcedSeries {
        let key = CacheKey::new(id.cache_id(&self.config), start, end);

        match self.cache.get(&key) {
            Ok(Some(series)) => {
                debug!(%key, points = series.len(), "cache hit");
                return SourcedSeries::new(series, SeriesOrigin::Cache);
            }
            Ok(None) => debug!(%key, "cache miss"),
            Err(e) => warn!(%key, error = %e, "cache read failed"),
        }

        let series = match self.download(id, start, end).await {
            Ok(series) => series,
            Err(e) => {
                warn!(series = %id, error = %e, "fetch failed, treating as no data");
                return SourcedSeries::missing();
            }
        };

        if series.is_empty() {
            warn!(series = %id, %start, %end, "no data in range");
            return SourcedSeries::missing();
        }

        if let Err(e) = self.cache.put(&key, &series) {
            warn!(%key, error = %e, "cache write failed");
        }
        SourcedSeries::new(series, SeriesOrigin::Market)
    }

    async fn download(
        &self,
        id: &SeriesId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailyFactorSeries> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        match id {
            SeriesId::RiskFree => {
                let observations = self.rates.fetch_rates(start, end).await?;
                Ok(rates_to_factors(&observations).clip(start, end))
            }
            SeriesId::Ticker(symbol) => {
                // Pad so the first day in range has a prior close.
                let padding = Days::new(self.config.ticker_padding_days.max(0).unsigned_abs());
                let from = start.checked_sub_days(padding).unwrap_or(start);
                let to = end.checked_add_days(Days::new(1)).unwrap_or(end);
                let closes = self.prices.fetch_closes(symbol, from, to).await?;
                Ok(
                    DailyFactorSeries::from_closes(closes.iter().map(|o| (o.date, o.value)))
                        .clip(start, end),
                )
            }
        }
    }
}
