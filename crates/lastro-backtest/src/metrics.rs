//! Window metrics.
//!
//! Risk and return statistics over trailing windows of a composite series,
//! measured against three benchmarks aligned to the same dates:
//! - CDI, the risk-free rate
//! - Ibovespa, the broad equity index
//! - IHFA proxy, the hedge-fund index approximated as CDI x 1.20
//!
//! Everything here is a pure function of its inputs.

use crate::window::Window;
use chrono::NaiveDate;
use lastro_data::DailyFactorSeries;
use ndarray::{Array1, ArrayView1, s};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading days per year.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Hedge-fund index proxy as a multiple of the CDI.
pub const HEDGE_FUND_CDI_MULTIPLIER: f64 = 1.20;

/// Floor on elapsed years when annualizing.
const MIN_YEARS: f64 = 0.1;

/// Deviations at or below this are rounding noise on a constant series.
const ZERO_DEVIATION: f64 = 1e-12;

/// Benchmark factors aligned to a portfolio's dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmarks {
    /// CDI factors
    pub cdi: Array1<f64>,
    /// Equity index factors
    pub equity: Array1<f64>,
    /// Hedge-fund index proxy factors
    pub hedge_fund: Array1<f64>,
}

impl Benchmarks {
    /// Align benchmark series to `dates`, filling missing days with 1.0.
    pub fn align(dates: &[NaiveDate], cdi: &DailyFactorSeries, equity: &DailyFactorSeries) -> Self {
        let cdi = Array1::from_vec(cdi.reindex(dates, 1.0));
        let hedge_fund = cdi.mapv(|f| (f - 1.0) * HEDGE_FUND_CDI_MULTIPLIER + 1.0);
        Self {
            equity: Array1::from_vec(equity.reindex(dates, 1.0)),
            cdi,
            hedge_fund,
        }
    }

    /// Benchmarks of constant 1.0 factors.
    pub fn flat(len: usize) -> Self {
        Self {
            cdi: Array1::ones(len),
            equity: Array1::ones(len),
            hedge_fund: Array1::ones(len),
        }
    }

    fn len(&self) -> usize {
        self.cdi.len()
    }
}

/// Statistics for one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    /// Window length in months
    pub months: u32,
    /// Window label
    pub label: String,
    /// Observations actually used (may be fewer than requested)
    pub trading_days: usize,
    /// Compounded return
    pub total_return: f64,
    /// Annualized return
    pub annualized_return: f64,
    /// Annualized volatility of daily returns
    pub volatility: f64,
    /// Annualized Sharpe ratio against the CDI
    pub sharpe: f64,
    /// Annualized Sortino ratio against the CDI
    pub sortino: f64,
    /// Worst peak-to-trough decline (zero or negative)
    pub max_drawdown: f64,
    /// CDI compounded return
    pub cdi_return: f64,
    /// Equity index compounded return
    pub ibov_return: f64,
    /// Hedge-fund proxy compounded return
    pub ihfa_return: f64,
    /// Excess over the CDI
    pub alpha_cdi: f64,
    /// Excess over the equity index
    pub alpha_ibov: f64,
    /// Excess over the hedge-fund proxy
    pub alpha_ihfa: f64,
}

/// Metrics for each requested window, keyed and ordered by window.
///
/// `portfolio` and `benchmarks` must be aligned; windows longer than the
/// data use every available observation.
pub fn compute(
    portfolio: &DailyFactorSeries,
    benchmarks: &Benchmarks,
    windows: &[Window],
) -> BTreeMap<Window, WindowMetrics> {
    let factors = Array1::from_iter(portfolio.factors());
    debug_assert_eq!(factors.len(), benchmarks.len());
    windows
        .iter()
        .map(|window| (*window, window_metrics(factors.view(), benchmarks, *window)))
        .collect()
}

/// Metrics over the trailing `min(window days, len)` observations.
pub fn window_metrics(
    portfolio: ArrayView1<'_, f64>,
    benchmarks: &Benchmarks,
    window: Window,
) -> WindowMetrics {
    let len = portfolio.len().min(benchmarks.len());
    let days = window.trading_days().min(len);
    let from = len - days;

    let pf = portfolio.slice(s![from..len]);
    let cdi = benchmarks.cdi.slice(s![from..len]);
    let ibov = benchmarks.equity.slice(s![from..len]);
    let ihfa = benchmarks.hedge_fund.slice(s![from..len]);

    let total_return = compounded(pf);
    let cdi_return = compounded(cdi);
    let ibov_return = compounded(ibov);
    let ihfa_return = compounded(ihfa);

    let returns = pf.mapv(|f| f - 1.0);
    let excess = &returns - &cdi.mapv(|f| f - 1.0);

    WindowMetrics {
        months: window.months(),
        label: window.label().to_string(),
        trading_days: days,
        total_return,
        annualized_return: annualize(total_return, days),
        volatility: sample_std(returns.view()) * TRADING_DAYS_PER_YEAR.sqrt(),
        sharpe: sharpe(excess.view()),
        sortino: sortino(excess.view()),
        max_drawdown: max_drawdown(pf),
        cdi_return,
        ibov_return,
        ihfa_return,
        alpha_cdi: total_return - cdi_return,
        alpha_ibov: total_return - ibov_return,
        alpha_ihfa: total_return - ihfa_return,
    }
}

/// `prod(f) - 1`.
pub fn compounded(factors: ArrayView1<'_, f64>) -> f64 {
    factors.product() - 1.0
}

/// Running product of factors.
pub fn cumulative(factors: ArrayView1<'_, f64>) -> Array1<f64> {
    let mut acc = 1.0;
    factors.mapv(|f| {
        acc *= f;
        acc
    })
}

/// `(1 + total)^(1 / years) - 1` with `years = days / 252`, floored at 0.1.
///
/// A total loss (`total <= -1`) annualizes to 0.
pub fn annualize(total_return: f64, days: usize) -> f64 {
    if total_return <= -1.0 {
        return 0.0;
    }
    let years = (days as f64 / TRADING_DAYS_PER_YEAR).max(MIN_YEARS);
    (1.0 + total_return).powf(1.0 / years) - 1.0
}

/// Sample standard deviation (n - 1); 0 with fewer than two values.
pub fn sample_std(values: ArrayView1<'_, f64>) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.mean().unwrap_or(0.0);
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}

/// Annualized mean over standard deviation of excess returns.
pub fn sharpe(excess: ArrayView1<'_, f64>) -> f64 {
    let std = sample_std(excess);
    if std <= ZERO_DEVIATION {
        return 0.0;
    }
    excess.mean().unwrap_or(0.0) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Annualized mean excess over the deviation of negative excess returns.
///
/// Zero with fewer than two downside observations or no downside spread.
pub fn sortino(excess: ArrayView1<'_, f64>) -> f64 {
    let downside: Array1<f64> = excess.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return 0.0;
    }
    let deviation = sample_std(downside.view());
    if deviation <= ZERO_DEVIATION {
        return 0.0;
    }
    excess.mean().unwrap_or(0.0) / deviation * TRADING_DAYS_PER_YEAR.sqrt()
}

/// `min(cum / running_max - 1)`; 0 for a series that never falls.
pub fn max_drawdown(factors: ArrayView1<'_, f64>) -> f64 {
    let mut peak = f64::MIN;
    cumulative(factors)
        .iter()
        .map(|&value| {
            peak = peak.max(value);
            value / peak - 1.0
        })
        .fold(0.0, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_compounded_and_cumulative() {
        let factors = array![1.1, 0.9, 1.05];
        assert_relative_eq!(compounded(factors.view()), 1.1 * 0.9 * 1.05 - 1.0, epsilon = 1e-12);
        let cum = cumulative(factors.view());
        assert_relative_eq!(cum[1], 0.99, epsilon = 1e-12);
        assert_relative_eq!(cum[2], 1.0395, epsilon = 1e-12);
    }

    #[test]
    fn test_annualize() {
        assert_relative_eq!(annualize(0.1, 252), 0.1, epsilon = 1e-12);
        assert_relative_eq!(annualize(0.21, 504), 0.1, epsilon = 1e-12);
        // Short windows are annualized as 0.1 years.
        assert_relative_eq!(annualize(0.01, 5), 1.01_f64.powf(10.0) - 1.0, epsilon = 1e-12);
        assert_eq!(annualize(-1.0, 252), 0.0);
    }

    #[test]
    fn test_sample_std() {
        let values = array![1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(sample_std(values.view()), (5.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(sample_std(array![1.0].view()), 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let factors = array![1.1, 0.5, 1.2, 1.5];
        // Peak 1.1, trough 0.55.
        assert_relative_eq!(max_drawdown(factors.view()), -0.5, epsilon = 1e-12);
        assert_eq!(max_drawdown(array![1.01, 1.01].view()), 0.0);
    }

    #[test]
    fn test_sharpe_and_sortino_degenerate() {
        let constant = Array1::from_elem(20, 0.0004);
        assert_eq!(sharpe(constant.view()), 0.0);
        assert_eq!(sortino(constant.view()), 0.0);

        let one_loss = array![0.01, -0.01, 0.02];
        assert_eq!(sortino(one_loss.view()), 0.0);
    }

    #[test]
    fn test_sortino_uses_downside_only() {
        let excess = array![0.02, -0.01, 0.03, -0.03, 0.01];
        let downside_std = sample_std(array![-0.01, -0.03].view());
        let expected = excess.mean().unwrap() / downside_std * TRADING_DAYS_PER_YEAR.sqrt();
        assert_relative_eq!(sortino(excess.view()), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_window_truncates_to_available_data() {
        let portfolio = Array1::from_elem(30, 1.001);
        let metrics = window_metrics(portfolio.view(), &Benchmarks::flat(30), Window::OneYear);

        assert_eq!(metrics.trading_days, 30);
        assert_eq!(metrics.label, "1 Ano");
        assert_relative_eq!(metrics.total_return, 1.001_f64.powi(30) - 1.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.alpha_cdi, metrics.total_return, epsilon = 1e-12);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_relative_eq!(metrics.volatility, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_window_uses_trailing_slice() {
        let mut values = vec![0.5; 10];
        values.extend(vec![1.01; 126]);
        let portfolio = Array1::from_vec(values);
        let metrics = window_metrics(portfolio.view(), &Benchmarks::flat(136), Window::SixMonths);

        assert_eq!(metrics.trading_days, 126);
        assert_relative_eq!(metrics.total_return, 1.01_f64.powi(126) - 1.0, epsilon = 1e-9);
    }
}
