//! Current vs proposed comparison.

use crate::backtest::{BacktestOutcome, Backtester};
use crate::metrics::WindowMetrics;
use crate::window::Window;
use chrono::NaiveDate;
use lastro_holdings::Holding;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proposed minus current, for one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowDiff {
    /// Total return difference
    pub return_diff: f64,
    /// Volatility difference
    pub vol_diff: f64,
    /// Sharpe difference
    pub sharpe_diff: f64,
    /// Max drawdown difference
    pub dd_diff: f64,
}

impl WindowDiff {
    /// `proposed - current` for each statistic.
    pub fn between(current: &WindowMetrics, proposed: &WindowMetrics) -> Self {
        Self {
            return_diff: proposed.total_return - current.total_return,
            vol_diff: proposed.volatility - current.volatility,
            sharpe_diff: proposed.sharpe - current.sharpe,
            dd_diff: proposed.max_drawdown - current.max_drawdown,
        }
    }
}

/// Both backtests and their per-window differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Current portfolio backtest
    pub current: BacktestOutcome,
    /// Proposed portfolio backtest
    pub proposed: BacktestOutcome,
    /// Differences for windows present on both sides
    pub diff: BTreeMap<Window, WindowDiff>,
}

/// Per-window differences; windows missing on either side are omitted.
pub fn diff(current: &BacktestOutcome, proposed: &BacktestOutcome) -> BTreeMap<Window, WindowDiff> {
    let (Some(current), Some(proposed)) = (current.windows(), proposed.windows()) else {
        return BTreeMap::new();
    };
    current
        .iter()
        .filter_map(|(window, cur)| {
            proposed
                .get(window)
                .map(|prop| (*window, WindowDiff::between(cur, prop)))
        })
        .collect()
}

impl Backtester<'_> {
    /// Backtest both portfolios, one after the other, and diff them.
    pub async fn compare(
        &self,
        current: &[Holding],
        proposed: &[Holding],
        windows: &[Window],
        as_of: NaiveDate,
    ) -> Comparison {
        let current = self.run(current, windows, as_of).await;
        let proposed = self.run(proposed, windows, as_of).await;
        let diff = diff(&current, &proposed);
        Comparison {
            current,
            proposed,
            diff,
        }
    }
}
