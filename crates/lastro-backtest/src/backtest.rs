//! Backtest runner.

use crate::composite::{Component, Compositor};
use crate::metrics::{Benchmarks, WindowMetrics, compute, cumulative};
use crate::window::Window;
use chrono::{Days, NaiveDate};
use lastro_data::{MarketDataGateway, SeriesOrigin};
use lastro_holdings::Holding;
use ndarray::{Array1, s};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Calendar days fetched per requested month.
const CALENDAR_DAYS_PER_MONTH: u64 = 31;

/// One point of a cumulative performance path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CumulativePoint {
    /// Date
    pub date: NaiveDate,
    /// Portfolio growth of 1.0
    pub portfolio: f64,
    /// CDI growth of 1.0
    pub cdi: f64,
}

/// A completed backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Metrics per window
    pub windows: BTreeMap<Window, WindowMetrics>,
    /// First aligned date
    pub start: NaiveDate,
    /// Last aligned date
    pub end: NaiveDate,
    /// Number of aligned dates
    pub observations: usize,
    /// Portfolio and CDI paths over the longest requested window
    pub cumulative: Vec<CumulativePoint>,
    /// Holdings that contributed to the composite
    pub components: Vec<Component>,
    /// Origin of the risk-free series
    pub cdi_origin: SeriesOrigin,
    /// Origin of the equity benchmark series
    pub ibov_origin: SeriesOrigin,
}

impl BacktestReport {
    /// Metrics for `window`, if it was computed.
    pub fn window(&self, window: Window) -> Option<&WindowMetrics> {
        self.windows.get(&window)
    }
}

/// Result of a backtest run.
///
/// Serializes as the report itself or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BacktestOutcome {
    /// Metrics were computed
    Completed(Box<BacktestReport>),
    /// The composite could not be built
    Failed {
        /// Why
        error: String,
    },
}

impl BacktestOutcome {
    /// The report, if completed.
    pub fn report(&self) -> Option<&BacktestReport> {
        match self {
            Self::Completed(report) => Some(report.as_ref()),
            Self::Failed { .. } => None,
        }
    }

    /// The error message, if failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Failed { error } => Some(error),
        }
    }

    /// Metrics per window, if completed.
    pub fn windows(&self) -> Option<&BTreeMap<Window, WindowMetrics>> {
        self.report().map(|r| &r.windows)
    }
}

/// Runs backtests through a market data gateway.
#[derive(Debug, Clone, Copy)]
pub struct Backtester<'a> {
    gateway: &'a MarketDataGateway,
}

impl<'a> Backtester<'a> {
    /// Create a backtester on `gateway`.
    pub const fn new(gateway: &'a MarketDataGateway) -> Self {
        Self { gateway }
    }

    /// The gateway in use.
    pub const fn gateway(&self) -> &'a MarketDataGateway {
        self.gateway
    }

    /// Backtest `holdings` over `windows` ending at `as_of`.
    ///
    /// An empty window list means every window. History is fetched for the
    /// longest window, 31 calendar days per month.
    pub async fn run(
        &self,
        holdings: &[Holding],
        windows: &[Window],
        as_of: NaiveDate,
    ) -> BacktestOutcome {
        let mut windows = if windows.is_empty() {
            Window::ALL.to_vec()
        } else {
            windows.to_vec()
        };
        windows.sort();
        windows.dedup();
        let longest = windows.last().copied().unwrap_or(Window::FiveYears);

        let span = Days::new(u64::from(longest.months()) * CALENDAR_DAYS_PER_MONTH);
        let start = as_of.checked_sub_days(span).unwrap_or(NaiveDate::MIN);

        let composite = match Compositor::new(self.gateway).compose(holdings, start, as_of).await {
            Ok(composite) => composite,
            Err(e) => {
                warn!(error = %e, "backtest failed");
                return BacktestOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let equity_symbol = &self.gateway.config().equity_benchmark;
        let equity = self.gateway.ticker(equity_symbol, start, as_of).await;

        let dates: Vec<NaiveDate> = composite.series.dates().collect();
        let benchmarks = Benchmarks::align(&dates, &composite.risk_free.series, &equity.series);
        let metrics = compute(&composite.series, &benchmarks, &windows);

        let path_len = longest.trading_days().min(dates.len());
        let from = dates.len() - path_len;
        let portfolio_factors = Array1::from_iter(composite.series.factors());
        let portfolio_path = cumulative(portfolio_factors.slice(s![from..]));
        let cdi_path = cumulative(benchmarks.cdi.slice(s![from..]));
        let path = dates[from..]
            .iter()
            .zip(portfolio_path.iter().zip(cdi_path.iter()))
            .map(|(date, (portfolio, cdi))| CumulativePoint {
                date: *date,
                portfolio: *portfolio,
                cdi: *cdi,
            })
            .collect();

        if let Some(m) = metrics.get(&longest) {
            info!(
                window = %longest,
                total_return = m.total_return,
                volatility = m.volatility,
                sharpe = m.sharpe,
                components = composite.components.len(),
                "backtest completed"
            );
        }

        BacktestOutcome::Completed(Box::new(BacktestReport {
            windows: metrics,
            start: dates.first().copied().unwrap_or(start),
            end: dates.last().copied().unwrap_or(as_of),
            observations: dates.len(),
            cumulative: path,
            components: composite.components,
            cdi_origin: composite.risk_free.origin,
            ibov_origin: equity.origin,
        }))
    }
}
