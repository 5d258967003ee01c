//! Synthetic fallback series.
//!
//! Used when the risk-free rate cannot be fetched at all, so downstream code
//! always has a rate to scale.

use crate::series::DailyFactorSeries;
use crate::sources::bcb::TRADING_DAYS_PER_YEAR;
use chrono::NaiveDate;

/// Daily factor implied by `annual_rate` scaled by a CDI `multiplier`:
/// `(1 + annual_rate)^(multiplier / 252)`.
pub fn synthetic_daily_factor(annual_rate: f64, multiplier: f64) -> f64 {
    (1.0 + annual_rate).powf(multiplier / TRADING_DAYS_PER_YEAR)
}

/// Constant risk-free series over the business days of `[start, end]`.
pub fn synthetic_rate_series(
    start: NaiveDate,
    end: NaiveDate,
    annual_rate: f64,
) -> DailyFactorSeries {
    synthetic_scaled_series(start, end, annual_rate, 1.0)
}

/// Constant series for a CDI multiple, used when no rate data exists.
pub fn synthetic_scaled_series(
    start: NaiveDate,
    end: NaiveDate,
    annual_rate: f64,
    multiplier: f64,
) -> DailyFactorSeries {
    DailyFactorSeries::constant(start, end, synthetic_daily_factor(annual_rate, multiplier))
}
