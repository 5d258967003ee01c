//! Allocation by asset class.
//!
//! Current, proposed and (optionally) model portfolios are reduced to the
//! percentage held in each [`AssetClass`], then rolled up into the coarse
//! [`ExposureBucket`]s used in the summary view.

use crate::shares::percentages;
use lastro_holdings::{AssetClass, ExposureBucket, Holding, PortfolioSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One asset class across the three portfolios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassAllocation {
    /// Asset class
    pub class: AssetClass,
    /// Percent of the current portfolio
    pub current_pct: f64,
    /// Percent of the proposed portfolio
    pub proposed_pct: f64,
    /// Percent of the model portfolio
    pub model_pct: f64,
    /// Proposed minus current
    pub delta: f64,
}

/// Current and proposed percentages for an exposure bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExposureSplit {
    /// Percent of the current portfolio
    pub current: f64,
    /// Percent of the proposed portfolio
    pub proposed: f64,
}

/// Allocation comparison output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationComparison {
    /// Classes held by any portfolio, in taxonomy order
    pub class_breakdown: Vec<ClassAllocation>,
    /// Every exposure bucket, zero when nothing maps to it
    pub exposure_summary: BTreeMap<ExposureBucket, ExposureSplit>,
}

/// Percent of the portfolio held in each class.
pub fn class_shares(holdings: &[Holding], side: PortfolioSide) -> BTreeMap<AssetClass, f64> {
    let (pcts, _) = percentages(holdings, side);
    let mut shares = BTreeMap::new();
    for (holding, pct) in holdings.iter().zip(pcts) {
        if pct > 0.0 {
            *shares.entry(holding.category).or_insert(0.0) += pct;
        }
    }
    shares
}

/// Compare allocation by class between current, proposed and model portfolios.
///
/// The model portfolio is weighted like a proposal.
pub fn allocation_comparison(
    current: &[Holding],
    proposed: &[Holding],
    model: Option<&[Holding]>,
) -> AllocationComparison {
    let current = class_shares(current, PortfolioSide::Current);
    let proposed = class_shares(proposed, PortfolioSide::Proposed);
    let model = model
        .map(|m| class_shares(m, PortfolioSide::Proposed))
        .unwrap_or_default();

    let class_breakdown = AssetClass::all()
        .into_iter()
        .filter(|class| {
            current.contains_key(class) || proposed.contains_key(class) || model.contains_key(class)
        })
        .map(|class| {
            let current_pct = current.get(&class).copied().unwrap_or(0.0);
            let proposed_pct = proposed.get(&class).copied().unwrap_or(0.0);
            ClassAllocation {
                class,
                current_pct,
                proposed_pct,
                model_pct: model.get(&class).copied().unwrap_or(0.0),
                delta: proposed_pct - current_pct,
            }
        })
        .collect();

    let mut exposure_summary: BTreeMap<ExposureBucket, ExposureSplit> = ExposureBucket::all()
        .into_iter()
        .map(|bucket| (bucket, ExposureSplit::default()))
        .collect();
    for (class, pct) in &current {
        if let Some(split) = class.exposure().and_then(|b| exposure_summary.get_mut(&b)) {
            split.current += pct;
        }
    }
    for (class, pct) in &proposed {
        if let Some(split) = class.exposure().and_then(|b| exposure_summary.get_mut(&b)) {
            split.proposed += pct;
        }
    }

    AllocationComparison {
        class_breakdown,
        exposure_summary,
    }
}
