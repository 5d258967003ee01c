//! Daily closes from Yahoo Finance.

use super::{Observation, PriceSource};
use crate::config::GatewayConfig;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Yahoo Finance price source with rate limiting.
pub struct YahooPriceSource {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
}

impl std::fmt::Debug for YahooPriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceSource")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish_non_exhaustive()
    }
}

impl YahooPriceSource {
    /// Create a source with the configured request timeout and a 250 ms
    /// pause after each request.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let provider = yahoo::YahooConnector::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            provider,
            rate_limit_delay: Duration::from_millis(250),
        })
    }

    /// Replace the pause after each request.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit_delay: Duration) -> Self {
        self.rate_limit_delay = rate_limit_delay;
        self
    }

    /// Pause applied after each request.
    pub const fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_delay
    }
}

fn to_offset(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

/// UTC calendar date of a quote's Unix timestamp.
fn quote_date<T>(timestamp: T) -> Result<NaiveDate>
where
    T: Copy + std::fmt::Display,
    i64: TryFrom<T>,
{
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.date_naive())
        .ok_or_else(|| DataError::TimeConversion(format!("bad timestamp {timestamp}")))
}

#[async_trait]
impl PriceSource for YahooPriceSource {
    /// Adjusted closes for `symbol`; the raw close stands in when Yahoo
    /// reports no adjusted value.
    async fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let response = self
            .provider
            .get_quote_history(symbol, to_offset(start)?, to_offset(end)?)
            .await?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;

        sleep(self.rate_limit_delay).await;

        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        quotes
            .iter()
            .map(|q| {
                let date = quote_date(q.timestamp)?;
                let close = if q.adjclose > 0.0 { q.adjclose } else { q.close };
                Ok(Observation::new(date, close))
            })
            .collect()
    }
}
