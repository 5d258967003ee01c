//! Asset class taxonomy.
//!
//! Every free-text category coming from client statements, model portfolios
//! or manual entry is mapped onto [`AssetClass`] through a single alias table.
//! Matching ignores case, diacritics and repeated whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of asset classes used across the engine.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum AssetClass {
    /// Cash and cash-equivalent funds
    #[serde(rename = "Caixa")]
    Caixa,

    /// Floating-rate fixed income (% of CDI)
    #[serde(rename = "Renda Fixa Pos")]
    RendaFixaPos,

    /// Credit paying CDI plus a spread
    #[serde(rename = "Renda Fixa CDI+")]
    RendaFixaCdiPlus,

    /// Fixed-rate (prefixado) bonds
    #[serde(rename = "Renda Fixa Pre")]
    RendaFixaPre,

    /// Inflation-linked bonds (IPCA+)
    #[serde(rename = "Renda Fixa Inflacao")]
    RendaFixaInflacao,

    /// Multi-strategy hedge funds
    #[serde(rename = "Multimercados")]
    Multimercados,

    /// Equities
    #[serde(rename = "Renda Variavel")]
    RendaVariavel,

    /// Alternatives and hedges
    #[serde(rename = "Alternativos")]
    Alternativos,

    /// Listed tax-exempt funds (FII, FI-Infra, FIAGRO)
    #[serde(rename = "Fundos Listados Isentos")]
    FundosListadosIsentos,

    /// Pension plans
    #[serde(rename = "Previdencia")]
    Previdencia,

    /// Currency exposure
    #[serde(rename = "Cambial")]
    Cambial,

    /// Anything the alias table does not recognise
    #[default]
    #[serde(rename = "Outros")]
    Outros,
}

/// Alias table: folded category text -> asset class.
const ALIASES: &[(&str, AssetClass)] = &[
    ("caixa", AssetClass::Caixa),
    ("local caixa", AssetClass::Caixa),
    ("liquidez", AssetClass::Caixa),
    ("renda fixa pos", AssetClass::RendaFixaPos),
    ("renda fixa pos fixado", AssetClass::RendaFixaPos),
    ("renda fixa pos-fixado", AssetClass::RendaFixaPos),
    ("local renda fixa pos", AssetClass::RendaFixaPos),
    ("renda fixa cdi+", AssetClass::RendaFixaCdiPlus),
    ("renda fixa cdi +", AssetClass::RendaFixaCdiPlus),
    ("local renda fixa cdi+", AssetClass::RendaFixaCdiPlus),
    ("credito privado", AssetClass::RendaFixaCdiPlus),
    ("renda fixa pre", AssetClass::RendaFixaPre),
    ("renda fixa prefixado", AssetClass::RendaFixaPre),
    ("local renda fixa pre", AssetClass::RendaFixaPre),
    ("renda fixa inflacao", AssetClass::RendaFixaInflacao),
    ("local renda fixa inflacao", AssetClass::RendaFixaInflacao),
    ("renda fixa ipca", AssetClass::RendaFixaInflacao),
    ("multimercados", AssetClass::Multimercados),
    ("multimercado", AssetClass::Multimercados),
    ("local multimercado", AssetClass::Multimercados),
    ("local multimercados", AssetClass::Multimercados),
    ("renda variavel", AssetClass::RendaVariavel),
    ("local renda variavel", AssetClass::RendaVariavel),
    ("acoes", AssetClass::RendaVariavel),
    ("alternativos", AssetClass::Alternativos),
    ("alternativo", AssetClass::Alternativos),
    ("local alternativos", AssetClass::Alternativos),
    ("local hedges", AssetClass::Alternativos),
    ("fundos listados isentos", AssetClass::FundosListadosIsentos),
    ("rf fundos listados isentos", AssetClass::FundosListadosIsentos),
    ("fii", AssetClass::FundosListadosIsentos),
    ("fi-infra", AssetClass::FundosListadosIsentos),
    ("fiagro", AssetClass::FundosListadosIsentos),
    ("previdencia", AssetClass::Previdencia),
    ("cambial", AssetClass::Cambial),
    ("rf cambial", AssetClass::Cambial),
    ("outros", AssetClass::Outros),
];

impl AssetClass {
    /// Returns all asset classes in display order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Caixa,
            Self::RendaFixaPos,
            Self::RendaFixaCdiPlus,
            Self::RendaFixaPre,
            Self::RendaFixaInflacao,
            Self::Multimercados,
            Self::RendaVariavel,
            Self::Alternativos,
            Self::FundosListadosIsentos,
            Self::Previdencia,
            Self::Cambial,
            Self::Outros,
        ]
    }

    /// Returns the canonical display name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Caixa => "Caixa",
            Self::RendaFixaPos => "Renda Fixa Pos",
            Self::RendaFixaCdiPlus => "Renda Fixa CDI+",
            Self::RendaFixaPre => "Renda Fixa Pre",
            Self::RendaFixaInflacao => "Renda Fixa Inflacao",
            Self::Multimercados => "Multimercados",
            Self::RendaVariavel => "Renda Variavel",
            Self::Alternativos => "Alternativos",
            Self::FundosListadosIsentos => "Fundos Listados Isentos",
            Self::Previdencia => "Previdencia",
            Self::Cambial => "Cambial",
            Self::Outros => "Outros",
        }
    }

    /// Normalize free-text category into the taxonomy.
    ///
    /// Unknown or empty text maps to [`AssetClass::Outros`].
    pub fn normalize(raw: &str) -> Self {
        let key = fold(raw);
        if key.is_empty() {
            return Self::Outros;
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map_or(Self::Outros, |(_, class)| *class)
    }

    /// Exposure bucket used in the allocation summary, if any.
    pub const fn exposure(&self) -> Option<ExposureBucket> {
        match self {
            Self::RendaVariavel => Some(ExposureBucket::Equity),
            Self::RendaFixaInflacao | Self::RendaFixaPre => Some(ExposureBucket::RealRates),
            Self::RendaFixaCdiPlus | Self::RendaFixaPos => Some(ExposureBucket::Credit),
            Self::Alternativos => Some(ExposureBucket::Alternatives),
            Self::Caixa => Some(ExposureBucket::Cash),
            Self::Multimercados => Some(ExposureBucket::MultiStrategy),
            Self::FundosListadosIsentos => Some(ExposureBucket::ListedExempt),
            Self::Previdencia | Self::Cambial | Self::Outros => None,
        }
    }

    /// Whether income from this class is exempt from income tax.
    pub const fn is_tax_exempt(&self) -> bool {
        matches!(self, Self::FundosListadosIsentos)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Coarse exposure groups for the allocation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExposureBucket {
    /// Equities
    #[serde(rename = "rv")]
    Equity,
    /// Real-rate and fixed-rate bonds
    #[serde(rename = "juros_reais")]
    RealRates,
    /// Floating-rate credit
    #[serde(rename = "credito")]
    Credit,
    /// Alternatives
    #[serde(rename = "alternativos")]
    Alternatives,
    /// Cash
    #[serde(rename = "caixa")]
    Cash,
    /// Multi-strategy funds
    #[serde(rename = "multimercado")]
    MultiStrategy,
    /// Listed tax-exempt funds
    #[serde(rename = "listados")]
    ListedExempt,
}

impl ExposureBucket {
    /// Returns all buckets in display order.
    pub fn all() -> Vec<Self> {
        vec![
            Self::Equity,
            Self::RealRates,
            Self::Credit,
            Self::Alternatives,
            Self::Cash,
            Self::MultiStrategy,
            Self::ListedExempt,
        ]
    }

    /// Short key, as serialized.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Equity => "rv",
            Self::RealRates => "juros_reais",
            Self::Credit => "credito",
            Self::Alternatives => "alternativos",
            Self::Cash => "caixa",
            Self::MultiStrategy => "multimercado",
            Self::ListedExempt => "listados",
        }
    }
}

/// Fold text for matching: lowercase, strip Portuguese diacritics, collapse whitespace.
pub fn fold(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Caixa", AssetClass::Caixa)]
    #[case("  RENDA FIXA PÓS ", AssetClass::RendaFixaPos)]
    #[case("Renda Fixa Inflação", AssetClass::RendaFixaInflacao)]
    #[case("Local Renda Variável", AssetClass::RendaVariavel)]
    #[case("Multimercado", AssetClass::Multimercados)]
    #[case("Local   Hedges", AssetClass::Alternativos)]
    #[case("Previdência", AssetClass::Previdencia)]
    #[case("RF Cambial", AssetClass::Cambial)]
    #[case("FII", AssetClass::FundosListadosIsentos)]
    #[case("Criptoativos", AssetClass::Outros)]
    #[case("", AssetClass::Outros)]
    fn test_normalize(#[case] raw: &str, #[case] expected: AssetClass) {
        assert_eq!(AssetClass::normalize(raw), expected);
    }

    #[test]
    fn test_all_classes_roundtrip_through_name() {
        for class in AssetClass::all() {
            assert_eq!(AssetClass::normalize(class.name()), class);
        }
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Renda   Fixa Pré "), "renda fixa pre");
        assert_eq!(fold("Ação"), "acao");
    }

    #[test]
    fn test_exposure_buckets() {
        assert_eq!(
            AssetClass::RendaVariavel.exposure(),
            Some(ExposureBucket::Equity)
        );
        assert_eq!(
            AssetClass::RendaFixaPre.exposure(),
            Some(ExposureBucket::RealRates)
        );
        assert_eq!(AssetClass::Outros.exposure(), None);
        assert_eq!(ExposureBucket::all().len(), 7);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", AssetClass::RendaFixaCdiPlus), "Renda Fixa CDI+");
        assert_eq!(
            serde_json::to_string(&AssetClass::FundosListadosIsentos).unwrap(),
            "\"Fundos Listados Isentos\""
        );
    }
}
