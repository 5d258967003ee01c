//! Proxy resolution.
//!
//! Private credit, funds and bonds have no public price history, so each
//! holding is mapped to something observable: either a multiple of the CDI
//! daily rate or a listed ticker. Resolution never fails; the weakest rule
//! is a plain CDI multiplier of 1.0.

use crate::holding::{Holding, parse_number};
use crate::taxonomy::AssetClass;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Ticker used as the Brazilian broad equity proxy.
pub const EQUITY_INDEX_PROXY: &str = "BOVA11.SA";

/// Ticker used for inflation-linked bonds.
pub const INFLATION_PROXY: &str = "B5P211.SA";

/// Approximate ratio between a 1 p.p. CDI spread and the CDI level itself.
const CDI_SPREAD_SCALE: f64 = 8.0;

/// Fallback multiplier for inflation-linked proxies.
const INFLATION_FALLBACK: f64 = 1.08;

/// Real rate implied by [`INFLATION_FALLBACK`].
const INFLATION_REFERENCE_SPREAD: f64 = 0.06;

/// Exchange-traded codes with their own price history.
const LISTED_CODES: &[&str] = &[
    "B5P211", "IRFM11", "BOVA11", "SPXR11", "RURA11", "KNIP11", "XFIX11", "KDIF11", "ALZC11",
    "BIT11", "IDKA11",
];

static B3_SHARE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}\d{1,2}$").expect("valid share code pattern"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid number pattern"));

/// A return-generating proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Proxy {
    /// Daily CDI excess return scaled by `factor`.
    RateMultiplier {
        /// Multiplier applied to the daily CDI rate.
        factor: f64,
    },
    /// Listed instrument, with the CDI multiplier to use when it has no data.
    Ticker {
        /// Market data symbol.
        symbol: String,
        /// Multiplier used if the ticker series cannot be fetched.
        fallback_multiplier: f64,
    },
}

impl Proxy {
    /// CDI multiplier proxy.
    pub const fn rate(factor: f64) -> Self {
        Self::RateMultiplier { factor }
    }

    /// Ticker proxy.
    pub fn ticker(symbol: impl Into<String>, fallback_multiplier: f64) -> Self {
        Self::Ticker {
            symbol: symbol.into(),
            fallback_multiplier,
        }
    }

    /// Multiplier used when only the rate series is available.
    pub const fn rate_multiplier(&self) -> f64 {
        match self {
            Self::RateMultiplier { factor } => *factor,
            Self::Ticker {
                fallback_multiplier,
                ..
            } => *fallback_multiplier,
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateMultiplier { factor } => write!(f, "CDI x {factor:.2}"),
            Self::Ticker {
                symbol,
                fallback_multiplier,
            } => write!(f, "{symbol} (fallback CDI x {fallback_multiplier:.2})"),
        }
    }
}

/// Which rule produced a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyRule {
    /// Name or code contains a known listed code.
    ListedCode,
    /// Name or code is a B3 share code; mapped to the equity index.
    EquityCode,
    /// Rate text carried an indexer (CDI, IPCA).
    RateSpread,
    /// Default of the holding's asset class.
    Category,
    /// Nothing matched.
    Default,
}

/// A proxy together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedProxy {
    /// The proxy.
    pub proxy: Proxy,
    /// The rule that selected it.
    pub rule: ProxyRule,
}

/// Default proxy for an asset class, `None` for [`AssetClass::Outros`].
pub fn category_proxy(class: AssetClass) -> Option<Proxy> {
    let proxy = match class {
        AssetClass::Caixa => Proxy::rate(1.0),
        AssetClass::RendaFixaPos | AssetClass::Previdencia => Proxy::rate(1.02),
        AssetClass::RendaFixaCdiPlus => Proxy::rate(1.05),
        AssetClass::Multimercados => Proxy::rate(1.20),
        AssetClass::Alternativos => Proxy::rate(1.50),
        AssetClass::RendaFixaPre => Proxy::ticker("IRFM11.SA", 1.10),
        AssetClass::RendaFixaInflacao => Proxy::ticker(INFLATION_PROXY, INFLATION_FALLBACK),
        AssetClass::FundosListadosIsentos => Proxy::ticker("XFIX11.SA", 1.05),
        AssetClass::RendaVariavel => Proxy::ticker(EQUITY_INDEX_PROXY, 0.90),
        AssetClass::Cambial => Proxy::ticker("USDBRL=X", 1.0),
        AssetClass::Outros => return None,
    };
    Some(proxy)
}

/// Resolve a holding to its proxy.
///
/// Rules, first match wins: listed code in the name, B3 share code (equity or
/// uncategorized holdings only), indexer in the rate text, asset-class
/// default, CDI x 1.0.
pub fn resolve(holding: &Holding) -> ResolvedProxy {
    let resolved = resolve_inner(holding);
    tracing::debug!(
        asset = %holding.name,
        proxy = %resolved.proxy,
        rule = ?resolved.rule,
        "resolved proxy"
    );
    resolved
}

fn resolve_inner(holding: &Holding) -> ResolvedProxy {
    let labels: Vec<String> = std::iter::once(holding.name.as_str())
        .chain(holding.code.as_deref())
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(code) = labels
        .iter()
        .find_map(|label| LISTED_CODES.iter().find(|code| label.contains(*code)))
    {
        return ResolvedProxy {
            proxy: Proxy::ticker(format!("{code}.SA"), 1.0),
            rule: ProxyRule::ListedCode,
        };
    }

    if matches!(holding.category, AssetClass::Outros | AssetClass::RendaVariavel)
        && labels.iter().any(|label| is_share_code(label))
    {
        return ResolvedProxy {
            proxy: Proxy::ticker(EQUITY_INDEX_PROXY, 0.90),
            rule: ProxyRule::EquityCode,
        };
    }

    if let Some(proxy) = holding.rate.as_deref().and_then(rate_proxy) {
        return ResolvedProxy {
            proxy,
            rule: ProxyRule::RateSpread,
        };
    }

    category_proxy(holding.category).map_or(
        ResolvedProxy {
            proxy: Proxy::rate(1.0),
            rule: ProxyRule::Default,
        },
        |proxy| ResolvedProxy {
            proxy,
            rule: ProxyRule::Category,
        },
    )
}

/// Whether `text` looks like a B3 share or unit code ("VALE3", "TAEE11").
pub fn is_share_code(text: &str) -> bool {
    B3_SHARE_CODE.is_match(text.trim())
}

/// Proxy implied by a rate descriptor, if it names an indexer.
///
/// "CDI+1,5%" adds the spread scaled to the CDI level, "110% CDI" is a
/// straight multiplier, "IPCA+6%" maps to the inflation index with a
/// spread-adjusted fallback.
pub fn rate_proxy(rate: &str) -> Option<Proxy> {
    let upper = rate.to_uppercase();

    if upper.contains("CDI") {
        if let Some((_, after)) = upper.split_once('+') {
            if let Some(spread) = first_number(after) {
                return Some(Proxy::rate(1.0 + spread / 100.0 * CDI_SPREAD_SCALE));
            }
        } else if let Some(pct) = first_number(&upper).filter(|pct| *pct > 0.0) {
            return Some(Proxy::rate(pct / 100.0));
        }
    }

    if upper.contains("IPCA") {
        let fallback = upper
            .split_once('+')
            .and_then(|(_, after)| first_number(after))
            .map_or(INFLATION_FALLBACK, |spread| {
                INFLATION_FALLBACK * (1.0 + spread / 100.0) / (1.0 + INFLATION_REFERENCE_SPREAD)
            });
        return Some(Proxy::ticker(INFLATION_PROXY, fallback));
    }

    None
}

fn first_number(text: &str) -> Option<f64> {
    NUMBER
        .find(text)
        .and_then(|m| parse_number(m.as_str()))
}
