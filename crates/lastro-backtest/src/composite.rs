//! Return composition.
//!
//! Turns weighted holdings into one daily factor series. Each holding is
//! resolved to a proxy, the proxy to a factor series, and the series are
//! combined on the dates they all share.

use crate::error::{BacktestError, Result};
use chrono::NaiveDate;
use lastro_data::synthetic::synthetic_scaled_series;
use lastro_data::{DailyFactorSeries, MarketDataGateway, SeriesOrigin, SourcedSeries};
use lastro_holdings::{Holding, Proxy, ProxyRule, WeightBasis, resolve};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum number of dates common to every component.
pub const MIN_ALIGNED_DAYS: usize = 10;

/// Weight fields tried in order; the first with a positive total is used.
pub const WEIGHT_PREFERENCE: [WeightBasis; 3] = [
    WeightBasis::TargetPct,
    WeightBasis::CurrentPct,
    WeightBasis::Financial,
];

/// One holding's contribution to a composite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Holding name
    pub name: String,
    /// Normalized weight; components sum to 1
    pub weight: f64,
    /// Proxy used
    pub proxy: Proxy,
    /// Rule that selected the proxy
    pub rule: ProxyRule,
    /// Where the factor data came from
    pub origin: SeriesOrigin,
    /// Observations available before alignment
    pub observations: usize,
}

/// A portfolio's composite factor series.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSeries {
    /// Weighted factors on the aligned dates
    pub series: DailyFactorSeries,
    /// Holdings that contributed, with their normalized weights
    pub components: Vec<Component>,
    /// Risk-free series fetched for the same range
    pub risk_free: SourcedSeries,
}

/// Builds composite series through a gateway.
#[derive(Debug, Clone, Copy)]
pub struct Compositor<'a> {
    gateway: &'a MarketDataGateway,
}

impl<'a> Compositor<'a> {
    /// Create a compositor on `gateway`.
    pub const fn new(gateway: &'a MarketDataGateway) -> Self {
        Self { gateway }
    }

    /// Compose `holdings` over `[start, end]`.
    ///
    /// Holdings without a positive weight are skipped; holdings whose proxy
    /// yields no data are dropped and the remaining weights renormalized.
    pub async fn compose(
        &self,
        holdings: &[Holding],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<CompositeSeries> {
        let basis = WeightBasis::select(&WEIGHT_PREFERENCE, holdings)
            .ok_or(BacktestError::EmptyPortfolio)?;
        let weighted: Vec<(&Holding, f64)> = holdings
            .iter()
            .map(|h| (h, h.amount(basis)))
            .filter(|(_, w)| w.is_finite() && *w > 0.0)
            .collect();
        if weighted.is_empty() {
            return Err(BacktestError::EmptyPortfolio);
        }
        debug!(?basis, holdings = weighted.len(), "composing portfolio");

        let risk_free = self.gateway.risk_free(start, end).await;

        let mut components = Vec::with_capacity(weighted.len());
        let mut inputs = Vec::with_capacity(weighted.len());
        for (holding, weight) in weighted {
            let resolved = resolve(holding);
            let sourced = self.proxy_series(&resolved.proxy, &risk_free, start, end).await;
            if sourced.series.is_empty() {
                warn!(
                    asset = %holding.name,
                    proxy = %resolved.proxy,
                    "no data for holding, dropped"
                );
                continue;
            }
            components.push(Component {
                name: holding.name.clone(),
                weight,
                proxy: resolved.proxy,
                rule: resolved.rule,
                origin: sourced.origin,
                observations: sourced.series.len(),
            });
            inputs.push(sourced.series);
        }

        let weights = normalize(&components.iter().map(|c| c.weight).collect::<Vec<_>>());
        for (component, weight) in components.iter_mut().zip(&weights) {
            component.weight = *weight;
        }

        let series = weighted_sum(&weights, &inputs)?;
        Ok(CompositeSeries {
            series,
            components,
            risk_free,
        })
    }

    /// Factor series for one proxy.
    ///
    /// Rate proxies scale the risk-free series. Tickers use their own
    /// series, falling back to the risk-free series scaled by the proxy's
    /// fallback multiplier.
    async fn proxy_series(
        &self,
        proxy: &Proxy,
        risk_free: &SourcedSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SourcedSeries {
        match proxy {
            Proxy::RateMultiplier { factor } => {
                self.rate_series(risk_free, *factor, start, end, risk_free.origin)
            }
            Proxy::Ticker {
                symbol,
                fallback_multiplier,
            } => {
                let fetched = self.gateway.ticker(symbol, start, end).await;
                if !fetched.series.is_empty() {
                    return fetched;
                }
                debug!(%symbol, fallback_multiplier, "ticker unavailable, using rate fallback");
                self.rate_series(
                    risk_free,
                    *fallback_multiplier,
                    start,
                    end,
                    SeriesOrigin::RateFallback,
                )
            }
        }
    }

    fn rate_series(
        &self,
        risk_free: &SourcedSeries,
        multiplier: f64,
        start: NaiveDate,
        end: NaiveDate,
        origin: SeriesOrigin,
    ) -> SourcedSeries {
        if risk_free.series.is_empty() {
            let rate = self.gateway.config().synthetic_annual_rate;
            return SourcedSeries::new(
                synthetic_scaled_series(start, end, rate, multiplier),
                SeriesOrigin::Synthetic,
            );
        }
        SourcedSeries::new(risk_free.series.scaled(multiplier), origin)
    }
}

/// Scale non-negative weights to sum to 1.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        vec![0.0; weights.len()]
    }
}

/// Weighted sum of factors on the dates common to every series.
///
/// `weights` must already sum to 1. The result approximates a portfolio
/// rebalanced to the weights every day.
pub fn weighted_sum(weights: &[f64], series: &[DailyFactorSeries]) -> Result<DailyFactorSeries> {
    let Some((first, rest)) = series.split_first() else {
        return Err(BacktestError::NoReturnData);
    };

    let dates: Vec<NaiveDate> = first
        .dates()
        .filter(|date| rest.iter().all(|s| s.get(*date).is_some()))
        .collect();
    if dates.len() < MIN_ALIGNED_DAYS {
        return Err(BacktestError::InsufficientData {
            required: MIN_ALIGNED_DAYS,
            actual: dates.len(),
        });
    }

    Ok(DailyFactorSeries::from_unsorted(dates.iter().map(|date| {
        let factor = weights
            .iter()
            .zip(series)
            .map(|(w, s)| w * s.get(*date).unwrap_or(1.0))
            .sum::<f64>();
        (*date, factor)
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_normalize() {
        let weights = normalize(&[50.0, 30.0, 20.0]);
        assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(weights[0], 0.5);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_weighted_sum_on_intersection() {
        let a = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 31), 1.002);
        let b = DailyFactorSeries::constant(d(2024, 1, 8), d(2024, 2, 29), 1.0);

        let composite = weighted_sum(&[0.5, 0.5], &[a, b]).unwrap();
        assert_eq!(composite.first_date(), Some(d(2024, 1, 8)));
        assert_eq!(composite.last_date(), Some(d(2024, 1, 31)));
        assert!(composite.factors().all(|f| (f - 1.001).abs() < 1e-12));
    }

    #[test]
    fn test_weighted_sum_insufficient_overlap() {
        let a = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 12), 1.001);
        let b = DailyFactorSeries::constant(d(2024, 1, 8), d(2024, 1, 31), 1.001);

        let err = weighted_sum(&[0.5, 0.5], &[a, b]).unwrap_err();
        assert_eq!(
            err,
            BacktestError::InsufficientData {
                required: MIN_ALIGNED_DAYS,
                actual: 5
            }
        );
    }

    #[test]
    fn test_weighted_sum_without_series() {
        assert_eq!(weighted_sum(&[], &[]).unwrap_err(), BacktestError::NoReturnData);
    }
}
