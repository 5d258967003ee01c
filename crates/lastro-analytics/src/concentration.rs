//! Issuer and strategy concentration.

use crate::shares::percentages;
use lastro_holdings::{AssetClass, Holding, PortfolioSide};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Issuer bucket for holdings with neither an issuer nor a name.
pub const UNKNOWN_ISSUER: &str = "Outros";

/// Number of issuers in the top concentration figure.
pub const TOP_ISSUERS: usize = 5;

/// Exposure to one issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerShare {
    /// Issuer or institution
    pub issuer: String,
    /// Summed value
    pub financial_value: f64,
    /// Percent of the portfolio
    pub pct: f64,
    /// Number of holdings
    pub holdings: usize,
}

/// Exposure to one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyShare {
    /// Asset class
    pub strategy: AssetClass,
    /// Summed value
    pub financial_value: f64,
    /// Percent of the portfolio
    pub pct: f64,
    /// Number of holdings
    pub holdings: usize,
}

/// Concentration diagnostics for one portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationReport {
    /// Issuers, largest first
    pub by_issuer: Vec<IssuerShare>,
    /// Strategies, largest first
    pub by_strategy: Vec<StrategyShare>,
    /// Herfindahl-Hirschman index over issuer percentages
    pub hhi_issuer: f64,
    /// Combined percent of the five largest issuers
    pub top5_issuer_pct: f64,
    /// Total value
    pub total: f64,
}

/// Issuer of a holding: the explicit field, else the first word of its name.
pub fn issuer_of(holding: &Holding) -> String {
    holding
        .issuer
        .as_deref()
        .map(str::trim)
        .filter(|issuer| !issuer.is_empty())
        .or_else(|| holding.name.split_whitespace().next())
        .unwrap_or(UNKNOWN_ISSUER)
        .to_string()
}

/// Sum of squared percentages; 10 000 for a single position.
pub fn hhi(pcts: impl IntoIterator<Item = f64>) -> f64 {
    pcts.into_iter().map(|p| p * p).sum()
}

/// Concentration by issuer and by strategy.
///
/// Weighted like a current portfolio. Empty or valueless input gives an
/// empty report.
pub fn concentration(holdings: &[Holding]) -> ConcentrationReport {
    let (amounts, total) = PortfolioSide::Current.amounts(holdings);
    if total <= 0.0 {
        return ConcentrationReport::default();
    }
    let (pcts, _) = percentages(holdings, PortfolioSide::Current);

    let mut issuers: HashMap<String, (f64, f64, usize)> = HashMap::new();
    let mut strategies: HashMap<AssetClass, (f64, f64, usize)> = HashMap::new();
    for ((holding, amount), pct) in holdings.iter().zip(&amounts).zip(&pcts) {
        let entry = issuers.entry(issuer_of(holding)).or_default();
        entry.0 += amount;
        entry.1 += pct;
        entry.2 += 1;
        let entry = strategies.entry(holding.category).or_default();
        entry.0 += amount;
        entry.1 += pct;
        entry.2 += 1;
    }

    let mut by_issuer: Vec<IssuerShare> = issuers
        .into_iter()
        .map(|(issuer, (financial_value, pct, holdings))| IssuerShare {
            issuer,
            financial_value,
            pct,
            holdings,
        })
        .collect();
    by_issuer.sort_by(|a, b| {
        b.financial_value
            .total_cmp(&a.financial_value)
            .then_with(|| a.issuer.cmp(&b.issuer))
    });

    let mut by_strategy: Vec<StrategyShare> = strategies
        .into_iter()
        .map(|(strategy, (financial_value, pct, holdings))| StrategyShare {
            strategy,
            financial_value,
            pct,
            holdings,
        })
        .collect();
    by_strategy.sort_by(|a, b| {
        b.financial_value
            .total_cmp(&a.financial_value)
            .then_with(|| a.strategy.cmp(&b.strategy))
    });

    ConcentrationReport {
        hhi_issuer: hhi(by_issuer.iter().map(|s| s.pct)),
        top5_issuer_pct: by_issuer.iter().take(TOP_ISSUERS).map(|s| s.pct).sum(),
        by_issuer,
        by_strategy,
        total,
    }
}
