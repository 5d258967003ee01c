//! End-to-end resolution of realistic proposal records.

use approx::assert_relative_eq;
use lastro_holdings::{AssetClass, Holding, Proxy, ProxyRule, resolve};
use serde_json::json;

fn holdings() -> Vec<Holding> {
    serde_json::from_value(json!([
        {"Ativo": "CDB Banco Inter", "Categoria": "Renda Fixa Pós", "Taxa": "108% CDI", "Financeiro": "R$ 150.000,00"},
        {"ativo": "Debênture Rumo", "classe": "Renda Fixa CDI+", "taxa": "CDI+1,20%", "saldo_atual": 80000},
        {"ativo": "NTN-B 2035", "Categoria": "Renda Fixa Inflação", "taxa": "IPCA+6,50%", "Vencimento": "15/05/2035"},
        {"ativo": "Kinea Rendimentos KNIP11", "Categoria": "Fundos Listados Isentos"},
        {"ativo": "PETR4"},
        {"ativo": "Fundo Exclusivo", "Categoria": "Local Hedges"},
        {"ativo": "Cotas sem cadastro"}
    ]))
    .unwrap()
}

#[test]
fn test_every_holding_gets_a_proxy() {
    let resolved: Vec<_> = holdings().iter().map(resolve).collect();
    assert_eq!(resolved.len(), 7);

    assert_eq!(resolved[0].rule, ProxyRule::RateSpread);
    assert_relative_eq!(resolved[0].proxy.rate_multiplier(), 1.08, epsilon = 1e-12);

    assert_eq!(resolved[1].rule, ProxyRule::RateSpread);
    assert_relative_eq!(resolved[1].proxy.rate_multiplier(), 1.096, epsilon = 1e-12);

    assert_eq!(resolved[2].rule, ProxyRule::RateSpread);
    assert!(matches!(&resolved[2].proxy, Proxy::Ticker { symbol, .. } if symbol == "B5P211.SA"));

    assert_eq!(resolved[3].rule, ProxyRule::ListedCode);
    assert_eq!(resolved[3].proxy, Proxy::ticker("KNIP11.SA", 1.0));

    assert_eq!(resolved[4].rule, ProxyRule::EquityCode);

    assert_eq!(resolved[5].rule, ProxyRule::Category);
    assert_eq!(resolved[5].proxy, Proxy::rate(1.50));

    assert_eq!(resolved[6].rule, ProxyRule::Default);
    assert_eq!(resolved[6].proxy, Proxy::rate(1.0));
}

#[test]
fn test_adapter_normalizes_fields() {
    let all = holdings();
    assert_relative_eq!(all[0].financial_value, 150_000.0);
    assert_eq!(all[1].category, AssetClass::RendaFixaCdiPlus);
    assert!(all[2].maturity.is_some());
    assert_eq!(all[6].category, AssetClass::Outros);
}

#[test]
fn test_resolution_is_deterministic() {
    for holding in holdings() {
        assert_eq!(resolve(&holding), resolve(&holding));
    }
}

#[test]
fn test_proxy_serializes_tagged() {
    let value = serde_json::to_value(Proxy::ticker("BOVA11.SA", 0.9)).unwrap();
    assert_eq!(value["type"], "ticker");
    assert_eq!(value["symbol"], "BOVA11.SA");
}
