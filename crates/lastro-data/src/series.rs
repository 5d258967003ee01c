//! Daily factor series.
//!
//! A factor is a multiplicative daily growth rate: 1.0005 is a 0.05% gain.
//! Every [`DailyFactorSeries`] holds strictly increasing business days with
//! positive, finite factors; all constructors enforce this.

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A single dated factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorPoint {
    /// Business day
    pub date: NaiveDate,
    /// Multiplicative growth on that day
    pub factor: f64,
}

impl FactorPoint {
    /// Create a point.
    pub const fn new(date: NaiveDate, factor: f64) -> Self {
        Self { date, factor }
    }

    fn is_valid(&self) -> bool {
        self.factor.is_finite() && self.factor > 0.0 && is_business_day(self.date)
    }
}

/// Ordered `(date, factor)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FactorPoint>", into = "Vec<FactorPoint>")]
pub struct DailyFactorSeries {
    points: Vec<FactorPoint>,
}

impl DailyFactorSeries {
    /// Build a series, rejecting any point that breaks the invariants.
    pub fn new(points: Vec<FactorPoint>) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
            return Err(DataError::InvalidSeries(format!(
                "factor {} on {} is not a positive factor on a business day",
                bad.factor, bad.date
            )));
        }
        if let Some(pair) = points.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(DataError::InvalidSeries(format!(
                "dates not strictly increasing at {}",
                pair[1].date
            )));
        }
        Ok(Self { points })
    }

    /// Build a series from raw observations.
    ///
    /// Sorts by date, drops weekends and non-positive or non-finite factors,
    /// and keeps the last value for duplicated dates.
    pub fn from_unsorted(points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut points: Vec<FactorPoint> = points
            .into_iter()
            .map(|(date, factor)| FactorPoint::new(date, factor))
            .filter(FactorPoint::is_valid)
            .collect();
        // Stable sort keeps source order within a date, so the last one wins.
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<FactorPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    /// Series with no observations.
    pub const fn empty() -> Self {
        Self { points: Vec::new() }
    }

    /// Constant factor over every business day in `[start, end]`.
    pub fn constant(start: NaiveDate, end: NaiveDate, factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) {
            return Self::empty();
        }
        Self {
            points: business_days(start, end)
                .map(|date| FactorPoint::new(date, factor))
                .collect(),
        }
    }

    /// Day-over-day factors from closing prices.
    ///
    /// The first close only anchors the second day; non-positive closes are
    /// skipped.
    pub fn from_closes(closes: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let mut closes: Vec<(NaiveDate, f64)> = closes
            .into_iter()
            .filter(|(_, close)| close.is_finite() && *close > 0.0)
            .collect();
        closes.sort_by_key(|(date, _)| *date);
        closes.dedup_by_key(|(date, _)| *date);
        Self::from_unsorted(
            closes
                .windows(2)
                .map(|pair| (pair[1].0, pair[1].1 / pair[0].1)),
        )
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Observations in date order.
    pub fn points(&self) -> &[FactorPoint] {
        &self.points
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Factors in date order.
    pub fn factors(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.factor)
    }

    /// First observation date.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Last observation date.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Factor on `date`, if observed.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].factor)
    }

    /// Factors on `dates`, with `fill` where the series has no observation.
    pub fn reindex(&self, dates: &[NaiveDate], fill: f64) -> Vec<f64> {
        dates
            .iter()
            .map(|date| self.get(*date).unwrap_or(fill))
            .collect()
    }

    /// Scale the daily excess over 1.0: `(f - 1) * multiplier + 1`.
    ///
    /// Points whose scaled factor is not positive are dropped.
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            points: self
                .points
                .iter()
                .map(|p| FactorPoint::new(p.date, (p.factor - 1.0) * multiplier + 1.0))
                .filter(FactorPoint::is_valid)
                .collect(),
        }
    }

    /// Observations within `[start, end]`.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| p.date >= start && p.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Compounded return over the whole series, `prod(f) - 1`.
    pub fn total_return(&self) -> f64 {
        self.factors().product::<f64>() - 1.0
    }
}

impl TryFrom<Vec<FactorPoint>> for DailyFactorSeries {
    type Error = DataError;

    fn try_from(points: Vec<FactorPoint>) -> Result<Self> {
        Self::new(points)
    }
}

impl From<DailyFactorSeries> for Vec<FactorPoint> {
    fn from(series: DailyFactorSeries) -> Self {
        series.points
    }
}

/// Monday to Friday.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days in `[start, end]`, ascending.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |date| *date <= end)
        .filter(|date| is_business_day(*date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(d(2024, 1, 5), true)]
    #[case(d(2024, 1, 6), false)]
    #[case(d(2024, 1, 7), false)]
    #[case(d(2024, 1, 8), true)]
    fn test_is_business_day(#[case] date: NaiveDate, #[case] expected: bool) {
        assert_eq!(is_business_day(date), expected);
    }

    #[rstest]
    #[case(d(2024, 1, 1), d(2024, 1, 7), 5)]
    #[case(d(2024, 1, 6), d(2024, 1, 7), 0)]
    #[case(d(2024, 1, 8), d(2024, 1, 1), 0)]
    fn test_business_days(#[case] start: NaiveDate, #[case] end: NaiveDate, #[case] count: usize) {
        assert_eq!(business_days(start, end).count(), count);
    }

    #[test]
    fn test_new_enforces_invariants() {
        // 2024-01-01 is a Monday.
        let ok = DailyFactorSeries::new(vec![
            FactorPoint::new(d(2024, 1, 1), 1.001),
            FactorPoint::new(d(2024, 1, 2), 0.999),
        ]);
        assert!(ok.is_ok());

        let weekend = DailyFactorSeries::new(vec![FactorPoint::new(d(2024, 1, 6), 1.0)]);
        assert!(matches!(weekend, Err(DataError::InvalidSeries(_))));

        let negative = DailyFactorSeries::new(vec![FactorPoint::new(d(2024, 1, 2), -0.5)]);
        assert!(negative.is_err());

        let unordered = DailyFactorSeries::new(vec![
            FactorPoint::new(d(2024, 1, 3), 1.0),
            FactorPoint::new(d(2024, 1, 2), 1.0),
        ]);
        assert!(unordered.is_err());

        let nan = DailyFactorSeries::new(vec![FactorPoint::new(d(2024, 1, 2), f64::NAN)]);
        assert!(nan.is_err());
    }

    #[test]
    fn test_from_unsorted_cleans_input() {
        let series = DailyFactorSeries::from_unsorted(vec![
            (d(2024, 1, 3), 1.002),
            (d(2024, 1, 1), 1.001),
            (d(2024, 1, 6), 1.5),
            (d(2024, 1, 3), 1.003),
            (d(2024, 1, 2), 0.0),
        ]);
        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 3)]);
        assert_eq!(series.get(d(2024, 1, 3)), Some(1.003));
    }

    #[test]
    fn test_constant_skips_weekends() {
        let series = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 14), 1.0005);
        assert_eq!(series.len(), 10);
        assert!(series.dates().all(is_business_day));
        assert!(DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 14), 0.0).is_empty());
    }

    #[test]
    fn test_from_closes() {
        let series = DailyFactorSeries::from_closes(vec![
            (d(2024, 1, 2), 110.0),
            (d(2024, 1, 1), 100.0),
            (d(2024, 1, 3), 99.0),
        ]);
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series.get(d(2024, 1, 2)).unwrap(), 1.1, epsilon = 1e-12);
        assert_relative_eq!(series.get(d(2024, 1, 3)).unwrap(), 0.9, epsilon = 1e-12);
        assert_relative_eq!(series.total_return(), -0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_and_clip() {
        let series = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 5), 1.001);
        let scaled = series.scaled(1.5);
        assert_relative_eq!(scaled.get(d(2024, 1, 1)).unwrap(), 1.0015, epsilon = 1e-12);

        let crash = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 5), 0.5).scaled(3.0);
        assert!(crash.is_empty());

        let clipped = series.clip(d(2024, 1, 2), d(2024, 1, 3));
        assert_eq!(clipped.len(), 2);
        assert_eq!(clipped.first_date(), Some(d(2024, 1, 2)));
    }

    #[test]
    fn test_reindex_fills_gaps() {
        let series = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 2), 1.01);
        let values = series.reindex(&[d(2024, 1, 1), d(2024, 1, 3)], 1.0);
        assert_eq!(values, vec![1.01, 1.0]);
    }

    #[test]
    fn test_deserialize_validates() {
        let series = DailyFactorSeries::constant(d(2024, 1, 1), d(2024, 1, 3), 1.0004);
        let json = serde_json::to_string(&series).unwrap();
        let back: DailyFactorSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);

        let bad = r#"[{"date":"2024-01-06","factor":1.0}]"#;
        assert!(serde_json::from_str::<DailyFactorSeries>(bad).is_err());
    }
}
