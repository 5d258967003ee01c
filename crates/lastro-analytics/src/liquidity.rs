//! Liquidity profile.
//!
//! Each holding is assigned a settlement term in days: an explicit `D+N`
//! liquidity text wins, then the fund table, then the conservative default.
//! Values are bucketed into four tiers and reported as percentages.

use crate::shares::percentages;
use lastro_holdings::proxy::is_share_code;
use lastro_holdings::{Holding, PortfolioSide};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Settlement term assumed when nothing else is known.
pub const DEFAULT_SETTLEMENT_DAYS: u32 = 60;

/// Settlement term of exchange-listed shares.
pub const LISTED_SETTLEMENT_DAYS: u32 = 2;

/// Names this short only match a table row exactly.
const MIN_PARTIAL_NAME_LEN: usize = 5;

static SETTLEMENT_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)D\s*\+\s*(\d+)").expect("valid settlement pattern"));

/// Days in a `D+N` term, if the text contains one.
pub fn settlement_days(text: &str) -> Option<u32> {
    SETTLEMENT_TERM
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Liquidity tier by settlement term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LiquidityTier {
    /// Same or next day
    #[serde(rename = "D+0-1")]
    Immediate,
    /// Two to five days
    #[serde(rename = "D+2-5")]
    Short,
    /// Six to thirty days
    #[serde(rename = "D+6-30")]
    Medium,
    /// More than thirty days
    #[serde(rename = "D+30+")]
    Long,
}

impl LiquidityTier {
    /// All tiers, fastest first.
    pub const ALL: [Self; 4] = [Self::Immediate, Self::Short, Self::Medium, Self::Long];

    /// Tier for a settlement term.
    pub const fn from_days(days: u32) -> Self {
        match days {
            0..=1 => Self::Immediate,
            2..=5 => Self::Short,
            6..=30 => Self::Medium,
            _ => Self::Long,
        }
    }

    /// Display label.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Immediate => "D+0-1",
            Self::Short => "D+2-5",
            Self::Medium => "D+6-30",
            Self::Long => "D+30+",
        }
    }

    /// Whether the tier settles within five days.
    pub const fn is_quick(&self) -> bool {
        matches!(self, Self::Immediate | Self::Short)
    }
}

impl fmt::Display for LiquidityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors loading a liquidity table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The CSV could not be read or parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One fund's redemption terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundLiquidity {
    /// ANBIMA code
    #[serde(rename = "Código Anbima", alias = "codigo", default)]
    pub code: Option<String>,
    /// Internal portfolio id
    #[serde(rename = "Id Carteira", alias = "id_carteira", default)]
    pub portfolio_id: Option<String>,
    /// Short name
    #[serde(rename = "Apelido", alias = "apelido", default)]
    pub nickname: Option<String>,
    /// Registered name
    #[serde(rename = "Nome", alias = "nome", default)]
    pub name: Option<String>,
    /// Days from redemption request to quota conversion
    #[serde(rename = "Conversão Resgate", alias = "conversao_resgate", default)]
    pub conversion_days: Option<u32>,
    /// Days from conversion to cash
    #[serde(rename = "Liquid. Resgate", alias = "liquidacao_resgate", default)]
    pub payment_days: Option<u32>,
}

impl FundLiquidity {
    /// Total days from request to cash.
    pub fn settlement_days(&self) -> u32 {
        self.conversion_days.unwrap_or(0) + self.payment_days.unwrap_or(0)
    }

    fn names(&self) -> impl Iterator<Item = String> + '_ {
        [self.nickname.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(|n| n.trim().to_uppercase())
            .filter(|n| !n.is_empty())
    }
}

/// Redemption terms of known funds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquidityTable {
    funds: Vec<FundLiquidity>,
}

impl LiquidityTable {
    /// Table over the given rows.
    pub const fn new(funds: Vec<FundLiquidity>) -> Self {
        Self { funds }
    }

    /// Load from CSV with a header row.
    ///
    /// Accepts either the registry's own headers ("Código Anbima", "Apelido",
    /// "Conversão Resgate", ...) or their snake_case forms.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    /// Load from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        Self::from_csv(csv::Reader::from_path(path)?)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, TableError> {
        let funds = reader
            .deserialize()
            .collect::<Result<Vec<FundLiquidity>, _>>()?;
        debug!(funds = funds.len(), "loaded liquidity table");
        Ok(Self::new(funds))
    }

    /// Number of funds.
    pub fn len(&self) -> usize {
        self.funds.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Find a fund by code, exact name, then partial name.
    ///
    /// Partial matching (either name containing the other) only applies to
    /// names longer than five characters.
    pub fn lookup(&self, name: &str, code: Option<&str>) -> Option<&FundLiquidity> {
        if let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) {
            let by_code = self
                .funds
                .iter()
                .find(|f| f.code.as_deref().map(str::trim) == Some(code))
                .or_else(|| {
                    self.funds
                        .iter()
                        .find(|f| f.portfolio_id.as_deref().map(str::trim) == Some(code))
                });
            if by_code.is_some() {
                return by_code;
            }
        }

        let name = name.trim().to_uppercase();
        if name.is_empty() {
            return None;
        }
        self.funds
            .iter()
            .find(|f| f.names().any(|n| n == name))
            .or_else(|| {
                if name.chars().count() <= MIN_PARTIAL_NAME_LEN {
                    return None;
                }
                self.funds
                    .iter()
                    .find(|f| f.names().any(|n| n.contains(&name) || name.contains(&n)))
            })
    }

    /// Settlement term for a holding.
    ///
    /// Explicit `D+N` text first, then the table, then listed share codes
    /// (D+2), then [`DEFAULT_SETTLEMENT_DAYS`].
    pub fn settlement_days_for(&self, holding: &Holding) -> u32 {
        if let Some(days) = holding.liquidity.as_deref().and_then(settlement_days) {
            return days;
        }
        if let Some(fund) = self.lookup(&holding.name, holding.code.as_deref()) {
            return fund.settlement_days();
        }
        let listed = [Some(holding.name.as_str()), holding.code.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| is_share_code(&text.to_uppercase()));
        if listed {
            LISTED_SETTLEMENT_DAYS
        } else {
            DEFAULT_SETTLEMENT_DAYS
        }
    }
}

/// Percent of a portfolio in each tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityProfile {
    /// Every tier, zero when empty
    pub buckets: BTreeMap<LiquidityTier, f64>,
    /// Percent settling within five days
    pub quick_cash: f64,
}

impl Default for LiquidityProfile {
    fn default() -> Self {
        Self {
            buckets: LiquidityTier::ALL.into_iter().map(|t| (t, 0.0)).collect(),
            quick_cash: 0.0,
        }
    }
}

impl LiquidityProfile {
    /// Bucket a portfolio weighted as `side`.
    pub fn of(holdings: &[Holding], side: PortfolioSide, table: &LiquidityTable) -> Self {
        let mut profile = Self::default();
        let (pcts, total) = percentages(holdings, side);
        if total <= 0.0 {
            return profile;
        }
        for (holding, pct) in holdings.iter().zip(pcts) {
            let tier = LiquidityTier::from_days(table.settlement_days_for(holding));
            *profile.buckets.entry(tier).or_insert(0.0) += pct;
        }
        profile.quick_cash = profile
            .buckets
            .iter()
            .filter(|(tier, _)| tier.is_quick())
            .map(|(_, pct)| pct)
            .sum();
        profile
    }

    /// Percent in `tier`.
    pub fn pct(&self, tier: LiquidityTier) -> f64 {
        self.buckets.get(&tier).copied().unwrap_or(0.0)
    }
}

/// Current vs proposed liquidity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityComparison {
    /// Current portfolio
    pub current: LiquidityProfile,
    /// Proposed portfolio
    pub proposed: LiquidityProfile,
}

/// Liquidity profiles of both portfolios.
pub fn liquidity_comparison(
    current: &[Holding],
    proposed: &[Holding],
    table: &LiquidityTable,
) -> LiquidityComparison {
    LiquidityComparison {
        current: LiquidityProfile::of(current, PortfolioSide::Current, table),
        proposed: LiquidityProfile::of(proposed, PortfolioSide::Proposed, table),
    }
}
