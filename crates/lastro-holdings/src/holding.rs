//! Canonical holding record.
//!
//! Holdings reach the engine as loosely keyed JSON objects: client statements,
//! model portfolios and the proposal editor all use different column names for
//! the same field. [`Holding::from_record`] is the one place that knows those
//! aliases; everything downstream works with the typed record.

use crate::taxonomy::AssetClass;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Map, Value};

const NAME_KEYS: &[&str] = &["ativo", "Ativo", "nome", "Nome", "name"];
const CODE_KEYS: &[&str] = &["Codigo", "Código", "codigo", "código", "ticker"];
const CATEGORY_KEYS: &[&str] = &[
    "Categoria",
    "categoria",
    "Estrategia",
    "Estratégia",
    "estrategia",
    "classe",
    "Classe",
    "Subcategoria",
    "subcategoria",
];
const FINANCIAL_KEYS: &[&str] = &["Financeiro", "financeiro", "saldo_atual", "Saldo Bruto Atual"];
const TARGET_PCT_KEYS: &[&str] = &["pct_alvo", "Proposta %", "proposta_pct", "% Alvo", "Proposta"];
const CURRENT_PCT_KEYS: &[&str] = &["% Atual", "pct_atual", "% PL"];
const RATE_KEYS: &[&str] = &["taxa", "Taxa", "indexador", "Indexador"];
const MATURITY_KEYS: &[&str] = &["Vencimento", "vencimento"];
const LIQUIDITY_KEYS: &[&str] = &["Prazo Liquidez", "prazo_liquidez", "liquidez", "Liquidez"];
const ISSUER_KEYS: &[&str] = &[
    "instituicao",
    "Instituicao",
    "Instituição",
    "instituição",
    "emissor",
    "Emissor",
];
const EXEMPT_KEYS: &[&str] = &["Isento", "isento"];

/// Date layouts accepted for maturities.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d/%m/%y"];

/// A single position in a portfolio.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Holding {
    /// Asset name as written by the source.
    pub name: String,
    /// Exchange or registry code, if any.
    pub code: Option<String>,
    /// Normalized asset class.
    pub category: AssetClass,
    /// Category text before normalization.
    pub raw_category: String,
    /// Market value in currency units (0 when absent).
    pub financial_value: f64,
    /// Current weight in percent (0 when absent).
    pub current_pct: f64,
    /// Target weight in percent (0 when absent).
    pub target_pct: f64,
    /// Rate descriptor such as "CDI+1,5%" or "IPCA+6%".
    pub rate: Option<String>,
    /// Parsed maturity date.
    pub maturity: Option<NaiveDate>,
    /// Maturity text as supplied, kept even when it does not parse.
    pub maturity_text: Option<String>,
    /// Liquidity term such as "D+30".
    pub liquidity: Option<String>,
    /// Issuer or custodian institution.
    pub issuer: Option<String>,
    /// Explicit tax-exemption flag from the source.
    pub tax_exempt: bool,
}

impl Holding {
    /// Create a holding with a name and category; other fields empty.
    pub fn new(name: impl Into<String>, category: &str) -> Self {
        Self {
            name: name.into(),
            category: AssetClass::normalize(category),
            raw_category: category.to_string(),
            ..Self::default()
        }
    }

    /// Set the financial value.
    pub const fn with_financial_value(mut self, value: f64) -> Self {
        self.financial_value = value;
        self
    }

    /// Set the current weight (percent).
    pub const fn with_current_pct(mut self, pct: f64) -> Self {
        self.current_pct = pct;
        self
    }

    /// Set the target weight (percent).
    pub const fn with_target_pct(mut self, pct: f64) -> Self {
        self.target_pct = pct;
        self
    }

    /// Set the rate descriptor.
    pub fn with_rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = Some(rate.into());
        self
    }

    /// Set the liquidity term.
    pub fn with_liquidity(mut self, liquidity: impl Into<String>) -> Self {
        self.liquidity = Some(liquidity.into());
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the maturity from text, parsing it when possible.
    pub fn with_maturity(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.maturity = parse_date(&text);
        self.maturity_text = Some(text);
        self
    }

    /// Build a holding from a loosely keyed record.
    ///
    /// Missing keys default to empty/zero; unparsable numbers and dates are
    /// treated as absent.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        let raw_category = text_field(record, CATEGORY_KEYS).unwrap_or_default();
        let maturity_text = text_field(record, MATURITY_KEYS);
        let maturity = maturity_text.as_deref().and_then(parse_date);
        let tax_exempt = text_field(record, EXEMPT_KEYS).is_some_and(|flag| {
            matches!(
                flag.trim().to_uppercase().as_str(),
                "SIM" | "S" | "TRUE" | "1" | "ISENTO"
            )
        });

        Self {
            name: text_field(record, NAME_KEYS).unwrap_or_default(),
            code: text_field(record, CODE_KEYS),
            category: AssetClass::normalize(&raw_category),
            raw_category,
            financial_value: number_field(record, FINANCIAL_KEYS, false),
            current_pct: number_field(record, CURRENT_PCT_KEYS, true),
            target_pct: number_field(record, TARGET_PCT_KEYS, true),
            rate: text_field(record, RATE_KEYS),
            maturity,
            maturity_text,
            liquidity: text_field(record, LIQUIDITY_KEYS),
            issuer: text_field(record, ISSUER_KEYS),
            tax_exempt,
        }
    }

    /// Build holdings from a list of JSON values, skipping non-objects.
    pub fn from_records(records: &[Value]) -> Vec<Self> {
        records
            .iter()
            .filter_map(Value::as_object)
            .map(Self::from_record)
            .collect()
    }

    /// Upper-cased, trimmed name used for cross-portfolio matching.
    pub fn match_key(&self) -> String {
        self.name.trim().to_uppercase()
    }

    /// Amount used for weighting on the given side of a comparison.
    ///
    /// The current side prefers money, the proposed side prefers target
    /// percentages; see [`PortfolioSide`].
    pub const fn amount(&self, basis: WeightBasis) -> f64 {
        match basis {
            WeightBasis::Financial => self.financial_value,
            WeightBasis::TargetPct => self.target_pct,
            WeightBasis::CurrentPct => self.current_pct,
        }
    }
}

impl From<Map<String, Value>> for Holding {
    fn from(record: Map<String, Value>) -> Self {
        Self::from_record(&record)
    }
}

/// Which field supplies a holding's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightBasis {
    /// Financial value in currency units.
    Financial,
    /// Target percentage.
    TargetPct,
    /// Current percentage.
    CurrentPct,
}

impl WeightBasis {
    /// First basis in `order` whose positive amounts over `holdings` sum above zero.
    pub fn select(order: &[Self], holdings: &[Holding]) -> Option<Self> {
        order.iter().copied().find(|basis| {
            holdings
                .iter()
                .map(|h| h.amount(*basis).max(0.0))
                .sum::<f64>()
                > 0.0
        })
    }
}

/// Side of a current-vs-proposed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioSide {
    /// Existing client portfolio: financial value, then current %, then target %.
    Current,
    /// Recommended portfolio: target %, then financial value, then current %.
    Proposed,
}

impl PortfolioSide {
    const fn preference(self) -> [WeightBasis; 3] {
        match self {
            Self::Current => [
                WeightBasis::Financial,
                WeightBasis::CurrentPct,
                WeightBasis::TargetPct,
            ],
            Self::Proposed => [
                WeightBasis::TargetPct,
                WeightBasis::Financial,
                WeightBasis::CurrentPct,
            ],
        }
    }

    /// First basis with a positive total over `holdings`.
    pub fn basis(self, holdings: &[Holding]) -> Option<WeightBasis> {
        WeightBasis::select(&self.preference(), holdings)
    }

    /// Per-holding amounts under the chosen basis, with their total.
    ///
    /// Returns zeros when no basis has a positive total.
    pub fn amounts(self, holdings: &[Holding]) -> (Vec<f64>, f64) {
        let Some(basis) = self.basis(holdings) else {
            return (vec![0.0; holdings.len()], 0.0);
        };
        let amounts: Vec<f64> = holdings.iter().map(|h| h.amount(basis).max(0.0)).collect();
        let total = amounts.iter().sum();
        (amounts, total)
    }
}

/// First non-empty text value among the candidate keys.
fn text_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = match record.get(*key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        let lowered = text.to_lowercase();
        if text.is_empty() || lowered == "nan" || lowered == "none" {
            None
        } else {
            Some(text)
        }
    })
}

/// First parseable number among the candidate keys.
fn number_field(record: &Map<String, Value>, keys: &[&str], positive_only: bool) -> f64 {
    keys.iter()
        .filter_map(|key| match record.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_number(s),
            _ => None,
        })
        .find(|v| v.is_finite() && (!positive_only || *v > 0.0))
        .unwrap_or(0.0)
}

/// Parse a number written with either decimal convention.
///
/// Accepts "1234.5", "1.234,56", "12,5%", "R$ 1.000". A lone dot group is
/// a decimal point ("1.500" is 1.5) unless the text is a currency amount.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let currency = trimmed.starts_with("R$");
    let cleaned: String = trimmed
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = match (cleaned.contains('.'), cleaned.contains(',')) {
        (true, true) => cleaned.replace('.', "").replace(',', "."),
        (false, true) => cleaned.replace(',', "."),
        (true, false) if is_thousands_grouped(&cleaned, currency) => cleaned.replace('.', ""),
        _ => cleaned,
    };
    normalized.parse::<f64>().ok()
}

/// "12.500.000", or "1.000" for currency amounts: dot-separated groups of
/// exactly three digits.
fn is_thousands_grouped(text: &str, currency: bool) -> bool {
    let mut groups = text.trim_start_matches('-').split('.');
    let head_ok = groups
        .next()
        .is_some_and(|g| !g.is_empty() && g.len() <= 3 && g.chars().all(|c| c.is_ascii_digit()));
    let rest: Vec<&str> = groups.collect();
    let min_groups = if currency { 1 } else { 2 };
    head_ok
        && rest.len() >= min_groups
        && rest
            .iter()
            .all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Parse a date in any of the accepted layouts.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // ISO timestamps: keep the date part.
    let text = if text.len() > 10 && text.as_bytes().get(4) == Some(&b'-') {
        text.get(..10).unwrap_or(text)
    } else {
        text
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
