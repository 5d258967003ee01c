//! Tax exemption and turnover.

use crate::shares::percentages;
use lastro_holdings::{Holding, PortfolioSide};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name fragments of instruments whose income is tax exempt.
pub const EXEMPT_KEYWORDS: &[&str] = &[
    "LCI", "LCA", "CRI", "CRA", "FII", "FIAGRO", "INFRA", "ISENTOS", "ISENTO", "KNIP", "KNRI",
    "KDIF", "RURA", "AZIN", "XPML", "HGLG", "MXRF",
];

/// Whether a holding's income is exempt: by class, explicit flag or name.
pub fn is_tax_exempt(holding: &Holding) -> bool {
    if holding.category.is_tax_exempt() || holding.tax_exempt {
        return true;
    }
    let name = holding.name.to_uppercase();
    EXEMPT_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// Percent of a portfolio in exempt holdings.
pub fn exempt_pct(holdings: &[Holding], side: PortfolioSide) -> f64 {
    let (pcts, _) = percentages(holdings, side);
    holdings
        .iter()
        .zip(pcts)
        .filter(|(holding, _)| is_tax_exempt(holding))
        .map(|(_, pct)| pct)
        .sum()
}

/// Name-level turnover between two portfolios.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turnover {
    /// Names only in the current portfolio
    pub leaving: usize,
    /// Names only in the proposal
    pub entering: usize,
    /// Names in both
    pub kept: usize,
    /// Distinct names in the current portfolio
    pub total_current: usize,
    /// Distinct names in the proposal
    pub total_proposed: usize,
}

impl Turnover {
    /// Compare distinct upper-cased names.
    pub fn between(current: &[Holding], proposed: &[Holding]) -> Self {
        let names = |holdings: &[Holding]| -> BTreeSet<String> {
            holdings
                .iter()
                .map(Holding::match_key)
                .filter(|key| !key.is_empty())
                .collect()
        };
        let current = names(current);
        let proposed = names(proposed);
        Self {
            leaving: current.difference(&proposed).count(),
            entering: proposed.difference(&current).count(),
            kept: current.intersection(&proposed).count(),
            total_current: current.len(),
            total_proposed: proposed.len(),
        }
    }

    /// Names that change hands: leaving plus entering.
    pub const fn changed(&self) -> usize {
        self.leaving + self.entering
    }
}

/// Tax efficiency of the current portfolio against the proposal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxAnalysis {
    /// Exempt percent of the current portfolio
    pub current_exempt_pct: f64,
    /// Exempt percent of the proposal
    pub proposed_exempt_pct: f64,
    /// Proposed minus current
    pub delta_exempt: f64,
    /// Name-level turnover
    pub turnover: Turnover,
    /// Size of the symmetric difference of the name sets
    pub changed: usize,
}

/// Exempt shares and turnover.
pub fn tax_analysis(current: &[Holding], proposed: &[Holding]) -> TaxAnalysis {
    let current_exempt_pct = exempt_pct(current, PortfolioSide::Current);
    let proposed_exempt_pct = exempt_pct(proposed, PortfolioSide::Proposed);
    let turnover = Turnover::between(current, proposed);
    TaxAnalysis {
        current_exempt_pct,
        proposed_exempt_pct,
        delta_exempt: proposed_exempt_pct - current_exempt_pct,
        changed: turnover.changed(),
        turnover,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Holding::new("LCA Banco do Brasil", "Renda Fixa Pos"), true)]
    #[case(Holding::new("Fundo Imobiliario", "FII"), true)]
    #[case(Holding::new("Debenture Incentivada", "Renda Fixa CDI+"), false)]
    #[case(Holding::new("Kinea KNIP11", ""), true)]
    #[case(Holding::new("CDB Pos", "Renda Fixa Pos"), false)]
    fn test_exemption(#[case] holding: Holding, #[case] expected: bool) {
        assert_eq!(is_tax_exempt(&holding), expected);
    }

    #[test]
    fn test_explicit_flag() {
        let mut holding = Holding::new("Debenture Incentivada", "Renda Fixa CDI+");
        holding.tax_exempt = true;
        assert!(is_tax_exempt(&holding));
    }

    #[test]
    fn test_tax_analysis() {
        let current = vec![
            Holding::new("LCI Itau", "").with_financial_value(25_000.0),
            Holding::new("CDB Itau", "").with_financial_value(75_000.0),
        ];
        let proposed = vec![
            Holding::new("lci itau", "").with_target_pct(40.0),
            Holding::new("HGLG11", "").with_target_pct(20.0),
            Holding::new("Tesouro Selic", "").with_target_pct(40.0),
        ];
        let analysis = tax_analysis(&current, &proposed);

        assert_relative_eq!(analysis.current_exempt_pct, 25.0, epsilon = 1e-9);
        assert_relative_eq!(analysis.proposed_exempt_pct, 60.0, epsilon = 1e-9);
        assert_relative_eq!(analysis.delta_exempt, 35.0, epsilon = 1e-9);
        assert_eq!(
            analysis.turnover,
            Turnover {
                leaving: 1,
                entering: 2,
                kept: 1,
                total_current: 2,
                total_proposed: 3,
            }
        );
        assert_eq!(analysis.changed, 3);
    }

    #[test]
    fn test_empty() {
        assert_eq!(tax_analysis(&[], &[]), TaxAnalysis::default());
    }
}
