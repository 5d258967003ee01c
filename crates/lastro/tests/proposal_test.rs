//! Proposal documents flowing into the analytics.

use lastro::analytics::{Classification, LiquidityTable, analyze};
use lastro::holdings::{AssetClass, parse_date};
use lastro::{Proposal, holdings_from_path};
use std::io::Write;

const DOCUMENT: &str = r#"{
    "client": "Familia Souza",
    "current": [
        {"Ativo": "Fundo DI Itau", "Categoria": "Caixa", "Financeiro": "R$ 300.000,00"},
        {"Ativo": "PETR4", "Categoria": "Acoes", "Financeiro": 100000}
    ],
    "proposed": [
        {"ativo": "Fundo DI Itau", "categoria": "Caixa", "pct_alvo": 40},
        {"ativo": "NTN-B 2035", "categoria": "Renda Fixa Inflacao", "pct_alvo": 60}
    ],
    "model": [
        {"ativo": "Caixa", "categoria": "Caixa", "pct_alvo": 10},
        {"ativo": "IPCA+", "categoria": "Renda Fixa Inflacao", "pct_alvo": 90}
    ]
}"#;

#[test]
fn test_document_drives_analysis() {
    let proposal = Proposal::from_json_str(DOCUMENT).unwrap();
    let analysis = analyze(
        &proposal.current,
        &proposal.proposed,
        proposal.model.as_deref(),
        &LiquidityTable::default(),
        parse_date("31/03/2025").unwrap(),
    );

    let tags: Vec<_> = analysis
        .classification
        .iter()
        .map(|e| (e.name.as_str(), e.classification))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("Fundo DI Itau", Classification::Neutro),
            ("PETR4", Classification::SaidaEstrutural),
        ]
    );

    let inflation = analysis
        .allocation
        .class_breakdown
        .iter()
        .find(|row| row.class == AssetClass::RendaFixaInflacao)
        .unwrap();
    assert_eq!(inflation.current_pct, 0.0);
    assert!((inflation.proposed_pct - 60.0).abs() < 1e-9);
    assert!((inflation.model_pct - 90.0).abs() < 1e-9);
}

#[test]
fn test_holdings_file() {
    let path = std::env::temp_dir().join(format!("lastro-holdings-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(br#"[{"ativo": "VALE3", "Financeiro": 1000}]"#).unwrap();
    drop(file);

    let holdings = holdings_from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].name, "VALE3");
}
