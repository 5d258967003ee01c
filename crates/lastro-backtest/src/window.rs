//! Trailing lookback windows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approximate trading days per month.
pub const TRADING_DAYS_PER_MONTH: usize = 21;

/// Trailing lookback period. Ordered by length; serialized by label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Window {
    /// 6 months
    #[serde(rename = "6 Meses")]
    SixMonths,
    /// 12 months
    #[serde(rename = "1 Ano")]
    OneYear,
    /// 24 months
    #[serde(rename = "2 Anos")]
    TwoYears,
    /// 36 months
    #[serde(rename = "3 Anos")]
    ThreeYears,
    /// 60 months
    #[serde(rename = "5 Anos")]
    FiveYears,
}

impl Window {
    /// All windows, shortest first.
    pub const ALL: [Self; 5] = [
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::ThreeYears,
        Self::FiveYears,
    ];

    /// Length in months.
    pub const fn months(self) -> u32 {
        match self {
            Self::SixMonths => 6,
            Self::OneYear => 12,
            Self::TwoYears => 24,
            Self::ThreeYears => 36,
            Self::FiveYears => 60,
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::SixMonths => "6 Meses",
            Self::OneYear => "1 Ano",
            Self::TwoYears => "2 Anos",
            Self::ThreeYears => "3 Anos",
            Self::FiveYears => "5 Anos",
        }
    }

    /// Requested trading days, `months * 21`.
    pub const fn trading_days(self) -> usize {
        self.months() as usize * TRADING_DAYS_PER_MONTH
    }

    /// Window with the given length in months.
    pub fn from_months(months: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.months() == months)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Window {
    type Err = String;

    /// Accepts a month count ("12", "12m") or a label ("1 Ano").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(window) = Self::ALL
            .into_iter()
            .find(|w| w.label().eq_ignore_ascii_case(trimmed))
        {
            return Ok(window);
        }
        trimmed
            .trim_end_matches(['m', 'M'])
            .parse::<u32>()
            .ok()
            .and_then(Self::from_months)
            .ok_or_else(|| format!("unknown window {s:?}; expected one of 6, 12, 24, 36, 60"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Window::SixMonths, 126)]
    #[case(Window::OneYear, 252)]
    #[case(Window::FiveYears, 1260)]
    fn test_trading_days(#[case] window: Window, #[case] days: usize) {
        assert_eq!(window.trading_days(), days);
    }

    #[rstest]
    #[case("12", Window::OneYear)]
    #[case("36m", Window::ThreeYears)]
    #[case("6 meses", Window::SixMonths)]
    #[case(" 2 Anos ", Window::TwoYears)]
    fn test_parse(#[case] text: &str, #[case] expected: Window) {
        assert_eq!(text.parse::<Window>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("18".parse::<Window>().is_err());
        assert!("".parse::<Window>().is_err());
    }

    #[test]
    fn test_order_and_serialization() {
        let mut windows = vec![Window::FiveYears, Window::SixMonths, Window::OneYear];
        windows.sort();
        assert_eq!(windows, vec![Window::SixMonths, Window::OneYear, Window::FiveYears]);
        assert_eq!(serde_json::to_string(&Window::OneYear).unwrap(), "\"1 Ano\"");
    }
}
