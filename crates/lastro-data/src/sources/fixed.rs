//! In-memory sources.
//!
//! Serve preloaded observations without touching the network. With nothing
//! loaded every request fails, which drives the gateway onto its fallbacks.

use super::{Observation, PriceSource, RateSource};
use crate::error::{DataError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

fn in_range(observations: &[Observation], start: NaiveDate, end: NaiveDate) -> Vec<Observation> {
    observations
        .iter()
        .filter(|o| o.date >= start && o.date <= end)
        .copied()
        .collect()
}

/// Rate source over a fixed list of observations.
#[derive(Debug, Default)]
pub struct FixedRateSource {
    observations: Vec<Observation>,
    requests: AtomicUsize,
}

impl FixedRateSource {
    /// Source serving `observations` (percent values).
    pub const fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            requests: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn fetch_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let observations = in_range(&self.observations, start, end);
        if observations.is_empty() {
            return Err(DataError::MissingData {
                symbol: "rate".to_string(),
                reason: "No observations loaded".to_string(),
            });
        }
        Ok(observations)
    }
}

/// Price source over fixed close histories, keyed by symbol.
#[derive(Debug, Default)]
pub struct FixedPriceSource {
    closes: HashMap<String, Vec<Observation>>,
    requests: AtomicUsize,
}

impl FixedPriceSource {
    /// Source with no symbols.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a close history for `symbol`.
    pub fn with_closes(mut self, symbol: impl Into<String>, closes: Vec<Observation>) -> Self {
        self.closes.insert(symbol.into(), closes);
        self
    }

    /// Number of fetches served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn fetch_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let closes = self
            .closes
            .get(symbol)
            .map(|closes| in_range(closes, start, end))
            .unwrap_or_default();
        if closes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No closes loaded".to_string(),
            });
        }
        Ok(closes)
    }
}
