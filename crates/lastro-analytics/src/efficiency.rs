//! Return per unit of risk, per window.

use lastro_backtest::{BacktestOutcome, Window};
use serde::{Deserialize, Serialize};

/// Efficiency figures for one window of a backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyRow {
    /// Window
    pub window: Window,
    /// Total return
    pub total_return: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Sharpe ratio
    pub sharpe: f64,
    /// Sortino ratio
    pub sortino: f64,
    /// Total return over volatility, 0 without volatility
    pub return_per_vol: f64,
    /// Excess over the CDI
    pub alpha_cdi: f64,
}

/// Efficiency table of a backtest, shortest window first.
///
/// A failed backtest has no rows.
pub fn efficiency(outcome: &BacktestOutcome) -> Vec<EfficiencyRow> {
    let Some(windows) = outcome.windows() else {
        return Vec::new();
    };
    windows
        .iter()
        .map(|(window, m)| EfficiencyRow {
            window: *window,
            total_return: m.total_return,
            volatility: m.volatility,
            sharpe: m.sharpe,
            sortino: m.sortino,
            return_per_vol: if m.volatility > 0.0 {
                m.total_return / m.volatility
            } else {
                0.0
            },
            alpha_cdi: m.alpha_cdi,
        })
        .collect()
}
