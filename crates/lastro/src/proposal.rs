//! Proposal documents.
//!
//! A proposal bundles the client's current portfolio, the proposed one and,
//! optionally, the model portfolio it was derived from. Each portfolio is a
//! list of holding records; a list may also arrive JSON-encoded inside a
//! string, as stored by the proposal database.

use lastro_holdings::Holding;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a proposal.
#[derive(Debug, Error)]
pub enum ProposalError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON, or has the wrong shape
    #[error("Invalid proposal JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A portfolio field is neither a list of records nor a string holding one
    #[error("Portfolio {field:?} must be a list of holding records")]
    NotAList {
        /// Offending field
        field: &'static str,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawProposal {
    #[serde(default, alias = "cliente", alias = "nome")]
    client: Option<String>,
    #[serde(default, alias = "carteira_dados", alias = "carteira_atual")]
    current: Value,
    #[serde(default, alias = "carteira_proposta")]
    proposed: Value,
    #[serde(default, alias = "modelo_dados")]
    model: Value,
}

/// A client's current and proposed portfolios.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proposal {
    /// Client or proposal name
    pub client: Option<String>,
    /// Current holdings
    pub current: Vec<Holding>,
    /// Proposed holdings
    pub proposed: Vec<Holding>,
    /// Model portfolio, when the proposal was built from one
    pub model: Option<Vec<Holding>>,
}

impl Proposal {
    /// Parse a proposal document.
    ///
    /// Accepts `current` / `proposed` / `model` keys or their stored names
    /// (`carteira_dados`, `carteira_proposta`, `modelo_dados`).
    pub fn from_json_str(text: &str) -> Result<Self, ProposalError> {
        let raw: RawProposal = serde_json::from_str(text)?;
        let model = records(raw.model, "model")?;
        Ok(Self {
            client: raw.client.filter(|c| !c.trim().is_empty()),
            current: records(raw.current, "current")?,
            proposed: records(raw.proposed, "proposed")?,
            model: (!model.is_empty()).then_some(model),
        })
    }

    /// Load a proposal document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProposalError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Whether neither portfolio has a holding.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.proposed.is_empty()
    }
}

/// Load a bare list of holding records, as used for a single portfolio.
pub fn holdings_from_path(path: impl AsRef<Path>) -> Result<Vec<Holding>, ProposalError> {
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    records(value, "holdings")
}

fn records(value: Value, field: &'static str) -> Result<Vec<Holding>, ProposalError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(Holding::from_records(&items)),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => match serde_json::from_str::<Value>(&text)? {
            Value::Array(items) => Ok(Holding::from_records(&items)),
            _ => Err(ProposalError::NotAList { field }),
        },
        _ => Err(ProposalError::NotAList { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_plain_document() {
        let proposal = Proposal::from_json_str(
            r#"{
                "client": "Familia Souza",
                "current": [{"ativo": "X", "Financeiro": 100000}],
                "proposed": [{"ativo": "X", "pct_alvo": 60}, {"ativo": "Y", "pct_alvo": 40}]
            }"#,
        )
        .unwrap();
        assert_eq!(proposal.client.as_deref(), Some("Familia Souza"));
        assert_eq!(proposal.current.len(), 1);
        assert_eq!(proposal.proposed.len(), 2);
        assert!(proposal.model.is_none());
        assert!(!proposal.is_empty());
    }

    #[test]
    fn test_stored_names_and_encoded_lists() {
        let proposal = Proposal::from_json_str(
            r#"{
                "nome": "Prospect 42",
                "carteira_dados": "[{\"ativo\": \"CDB Inter\", \"Financeiro\": \"R$ 50.000,00\"}]",
                "carteira_proposta": [{"ativo": "NTN-B 2035", "pct_alvo": 100}],
                "modelo_dados": "[]"
            }"#,
        )
        .unwrap();
        assert_eq!(proposal.client.as_deref(), Some("Prospect 42"));
        assert_eq!(proposal.current[0].financial_value, 50_000.0);
        assert_eq!(proposal.proposed[0].name, "NTN-B 2035");
        assert!(proposal.model.is_none());
    }

    #[rstest]
    #[case(r#"{"current": {"ativo": "X"}}"#)]
    #[case(r#"{"proposed": "{\"ativo\": \"X\"}"}"#)]
    #[case(r#"{"model": 3}"#)]
    fn test_non_list_portfolio(#[case] text: &str) {
        assert!(matches!(
            Proposal::from_json_str(text),
            Err(ProposalError::NotAList { .. })
        ));
    }

    #[test]
    fn test_empty_document() {
        let proposal = Proposal::from_json_str("{}").unwrap();
        assert!(proposal.is_empty());
    }
}
