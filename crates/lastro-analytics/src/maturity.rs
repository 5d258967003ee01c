//! Maturity ladder by calendar quarter.

use crate::shares::percentages;
use chrono::{Datelike, NaiveDate};
use lastro_holdings::{Holding, PortfolioSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Period key of the bucket for open-ended holdings.
pub const NO_MATURITY_PERIOD: &str = "SEM_VENC";

/// Label of the bucket for open-ended holdings.
pub const NO_MATURITY_LABEL: &str = "Sem Vencimento (Fundos)";

const QUARTER_LABELS: [&str; 4] = ["Jan-Mar", "Abr-Jun", "Jul-Set", "Out-Dez"];

/// Value maturing in one quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturityBucket {
    /// "YYYY-QN", or [`NO_MATURITY_PERIOD`]
    pub period: String,
    /// "Jan-Mar 2027", or [`NO_MATURITY_LABEL`]
    pub label: String,
    /// Summed value
    pub financial_value: f64,
    /// Percent of the portfolio
    pub pct: f64,
}

/// Quarter key and label for a date.
pub fn quarter(date: NaiveDate) -> (String, String) {
    let q = date.month0() / 3;
    (
        format!("{}-Q{}", date.year(), q + 1),
        format!("{} {}", QUARTER_LABELS[q as usize], date.year()),
    )
}

/// Group a portfolio by maturity quarter, earliest first.
///
/// Holdings without a parseable maturity land in a final open-ended bucket,
/// present only when it holds value.
pub fn maturity_ladder(holdings: &[Holding]) -> Vec<MaturityBucket> {
    let (amounts, total) = PortfolioSide::Current.amounts(holdings);
    if total <= 0.0 {
        return Vec::new();
    }
    let (pcts, _) = percentages(holdings, PortfolioSide::Current);

    let mut quarters: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    let mut open_ended = (0.0, 0.0);
    for ((holding, amount), pct) in holdings.iter().zip(amounts).zip(pcts) {
        let slot = match holding.maturity {
            Some(date) => quarters.entry(quarter_start(date)).or_default(),
            None => &mut open_ended,
        };
        slot.0 += amount;
        slot.1 += pct;
    }

    let mut ladder: Vec<MaturityBucket> = quarters
        .into_iter()
        .map(|(start, (financial_value, pct))| {
            let (period, label) = quarter(start);
            MaturityBucket {
                period,
                label,
                financial_value,
                pct,
            }
        })
        .collect();
    if open_ended.0 > 0.0 {
        ladder.push(MaturityBucket {
            period: NO_MATURITY_PERIOD.to_string(),
            label: NO_MATURITY_LABEL.to_string(),
            financial_value: open_ended.0,
            pct: open_ended.1,
        });
    }
    ladder
}

fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = date.month0() / 3 * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_quarter() {
        assert_eq!(quarter(d(2027, 2, 15)), ("2027-Q1".into(), "Jan-Mar 2027".into()));
        assert_eq!(quarter(d(2026, 9, 30)), ("2026-Q3".into(), "Jul-Set 2026".into()));
        assert_eq!(quarter(d(2030, 12, 1)), ("2030-Q4".into(), "Out-Dez 2030".into()));
    }

    #[test]
    fn test_ladder() {
        let holdings = vec![
            Holding::new("CDB 2028", "")
                .with_maturity("15/08/2028")
                .with_financial_value(20_000.0),
            Holding::new("LCA 2027", "")
                .with_maturity("2027-01-10")
                .with_financial_value(30_000.0),
            Holding::new("LCI 2027", "")
                .with_maturity("31/03/2027")
                .with_financial_value(10_000.0),
            Holding::new("Fundo", "")
                .with_maturity("-")
                .with_financial_value(40_000.0),
        ];
        let ladder = maturity_ladder(&holdings);

        let periods: Vec<&str> = ladder.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(periods, vec!["2027-Q1", "2028-Q3", "SEM_VENC"]);
        assert_relative_eq!(ladder[0].financial_value, 40_000.0);
        assert_relative_eq!(ladder[0].pct, 40.0, epsilon = 1e-9);
        assert_eq!(ladder[1].label, "Jul-Set 2028");
        assert_eq!(ladder[2].label, NO_MATURITY_LABEL);
        assert_relative_eq!(ladder.iter().map(|b| b.pct).sum::<f64>(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_all_dated_has_no_open_bucket() {
        let holdings = vec![
            Holding::new("CDB", "")
                .with_maturity("01/01/2026")
                .with_financial_value(1.0),
        ];
        let ladder = maturity_ladder(&holdings);
        assert_eq!(ladder.len(), 1);
        assert!(maturity_ladder(&[]).is_empty());
    }
}
