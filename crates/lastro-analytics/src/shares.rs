//! Portfolio shares under each side's weight basis.

use lastro_holdings::{Holding, PortfolioSide, WeightBasis};

/// Per-holding percentage of the side's total, with the total amount.
///
/// Percentages sum to 100 unless the total is zero, in which case all are 0.
pub(crate) fn percentages(holdings: &[Holding], side: PortfolioSide) -> (Vec<f64>, f64) {
    let (amounts, total) = side.amounts(holdings);
    if total <= 0.0 {
        return (amounts, 0.0);
    }
    (amounts.iter().map(|a| a / total * 100.0).collect(), total)
}

/// Per-holding percentage as the source states it.
///
/// Percentage bases are taken verbatim; financial values are converted to
/// shares of their total.
pub(crate) fn stated_percentages(holdings: &[Holding], side: PortfolioSide) -> Vec<f64> {
    match side.basis(holdings) {
        Some(basis @ (WeightBasis::TargetPct | WeightBasis::CurrentPct)) => {
            holdings.iter().map(|h| h.amount(basis).max(0.0)).collect()
        }
        Some(WeightBasis::Financial) => percentages(holdings, side).0,
        None => vec![0.0; holdings.len()],
    }
}
