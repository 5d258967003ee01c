//! Bottom-up classification of current holdings.
//!
//! Every holding of the current portfolio is tagged by what the proposal does
//! with it. The order of checks matters: a holding that survives in the
//! proposal is never reported as illiquid, and illiquidity outranks the
//! residual-position check.

use crate::liquidity::settlement_days;
use crate::shares::{percentages, stated_percentages};
use chrono::NaiveDate;
use lastro_holdings::{Holding, PortfolioSide, parse_date};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A proposal at or above this fraction of the current weight keeps conviction.
pub const RETAINED_RATIO: f64 = 0.9;

/// Current positions below this percent are residual.
pub const RESIDUAL_PCT: f64 = 0.5;

/// Settlement or maturity beyond this many days is illiquid.
pub const ILLIQUID_DAYS: i64 = 30;

/// Classification tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Kept at (nearly) the same weight or more
    #[serde(rename = "Convicto")]
    Convicto,
    /// Kept at a reduced weight
    #[serde(rename = "Neutro")]
    Neutro,
    /// Residual position
    #[serde(rename = "Observação")]
    Observacao,
    /// Dropped and redeemable
    #[serde(rename = "Saída Estrutural")]
    SaidaEstrutural,
    /// Dropped but held to maturity
    #[serde(rename = "Ilíquido em Carregamento")]
    IliquidoEmCarregamento,
}

impl Classification {
    /// All tags in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Convicto,
        Self::Neutro,
        Self::Observacao,
        Self::SaidaEstrutural,
        Self::IliquidoEmCarregamento,
    ];

    /// Sort priority, lowest first.
    pub const fn priority(&self) -> u8 {
        match self {
            Self::Convicto => 0,
            Self::Neutro => 1,
            Self::Observacao => 2,
            Self::SaidaEstrutural => 3,
            Self::IliquidoEmCarregamento => 4,
        }
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Convicto => "Convicto",
            Self::Neutro => "Neutro",
            Self::Observacao => "Observação",
            Self::SaidaEstrutural => "Saída Estrutural",
            Self::IliquidoEmCarregamento => "Ilíquido em Carregamento",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of one current holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationEntry {
    /// Holding name
    pub name: String,
    /// Tag
    pub classification: Classification,
    /// Human-readable rationale
    pub rationale: String,
    /// Percent of the current portfolio
    pub current_pct: f64,
    /// Percent in the proposal (0 when absent)
    pub proposed_pct: f64,
    /// Liquidity or maturity text, "N/D" when unknown
    pub liquidity: String,
    /// Current value
    pub financial_value: f64,
}

/// Proposed weights keyed by upper-cased name, in proposal order.
#[derive(Debug, Default)]
struct ProposalIndex {
    entries: Vec<(String, f64)>,
}

impl ProposalIndex {
    fn build(proposed: &[Holding]) -> Self {
        let mut index = Self::default();
        let pcts = stated_percentages(proposed, PortfolioSide::Proposed);
        for (holding, pct) in proposed.iter().zip(pcts) {
            let key = holding.match_key();
            if key.is_empty() {
                continue;
            }
            match index.entries.iter_mut().find(|(k, _)| *k == key) {
                Some(entry) => entry.1 = pct,
                None => index.entries.push((key, pct)),
            }
        }
        index
    }

    /// Exact name first; otherwise the first entry either name contains.
    fn weight(&self, key: &str) -> f64 {
        let exact = self
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(0.0, |(_, pct)| *pct);
        if exact > 0.0 || key.is_empty() {
            return exact;
        }
        self.entries
            .iter()
            .find(|(k, _)| key.contains(k.as_str()) || k.contains(key))
            .map_or(0.0, |(_, pct)| *pct)
    }
}

/// Liquidity text for a holding: the liquidity term, else the maturity text.
fn liquidity_text(holding: &Holding) -> Option<&str> {
    holding
        .liquidity
        .as_deref()
        .or(holding.maturity_text.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

/// Whether `text` marks a position that cannot be redeemed soon.
///
/// A date more than 30 days after `as_of` or a `D+N` term of 30 days or more.
pub fn is_illiquid(text: &str, as_of: NaiveDate) -> bool {
    if let Some(date) = parse_date(text) {
        return (date - as_of).num_days() > ILLIQUID_DAYS;
    }
    settlement_days(text).is_some_and(|days| i64::from(days) >= ILLIQUID_DAYS)
}

/// Tag every current holding against the proposal.
///
/// Sorted by tag priority, then by descending value. Returns nothing when the
/// current portfolio has no weight.
pub fn classify(
    current: &[Holding],
    proposed: &[Holding],
    as_of: NaiveDate,
) -> Vec<ClassificationEntry> {
    let (current_pcts, total) = percentages(current, PortfolioSide::Current);
    if total <= 0.0 {
        return Vec::new();
    }
    let (amounts, _) = PortfolioSide::Current.amounts(current);
    let index = ProposalIndex::build(proposed);

    let mut entries: Vec<ClassificationEntry> = current
        .iter()
        .zip(current_pcts)
        .zip(amounts)
        .map(|((holding, current_pct), amount)| {
            let proposed_pct = index.weight(&holding.match_key());
            let liquidity = liquidity_text(holding);

            let (classification, rationale) = if proposed_pct > 0.0
                && proposed_pct >= current_pct * RETAINED_RATIO
            {
                (
                    Classification::Convicto,
                    "Mantido ou aumentado na proposta".to_string(),
                )
            } else if proposed_pct > 0.0 {
                (
                    Classification::Neutro,
                    format!("Reduzido de {current_pct:.1}% para {proposed_pct:.1}%"),
                )
            } else if let Some(text) = liquidity.filter(|text| is_illiquid(text, as_of)) {
                (
                    Classification::IliquidoEmCarregamento,
                    format!("Sem liquidez imediata ({text}). Carregamento até vencimento."),
                )
            } else if current_pct < RESIDUAL_PCT {
                (
                    Classification::Observacao,
                    format!("Posição residual ({current_pct:.2}%)"),
                )
            } else {
                (
                    Classification::SaidaEstrutural,
                    "Não faz parte da proposta. Resgate quando possível.".to_string(),
                )
            };

            ClassificationEntry {
                name: holding.name.trim().to_string(),
                classification,
                rationale,
                current_pct,
                proposed_pct,
                liquidity: liquidity.unwrap_or("N/D").to_string(),
                financial_value: amount,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        a.classification
            .priority()
            .cmp(&b.classification.priority())
            .then_with(|| b.financial_value.total_cmp(&a.financial_value))
    });
    debug!(holdings = entries.len(), "classified current portfolio");
    entries
}
