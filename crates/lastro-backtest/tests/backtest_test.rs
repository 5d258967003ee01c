//! Composition, metrics and comparison over in-memory market data.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use lastro_backtest::metrics::{annualize, compute};
use lastro_backtest::{BacktestError, BacktestOutcome, Backtester, Benchmarks, Compositor, Window};
use lastro_data::{
    DailyFactorSeries, FixedPriceSource, FixedRateSource, GatewayConfig, MarketDataGateway,
    MemoryCache, NoopCache, Observation, SeriesOrigin, business_days,
};
use lastro_holdings::{Holding, Proxy, ProxyRule};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn as_of() -> NaiveDate {
    d(2024, 6, 28)
}

fn cdi(seed: u64) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    business_days(d(2018, 1, 1), d(2024, 12, 31))
        .map(|date| Observation::new(date, 0.04 + rng.gen_range(0.0..0.01)))
        .collect()
}

fn random_walk(seed: u64, from: NaiveDate, to: NaiveDate) -> Vec<Observation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0;
    business_days(from, to)
        .map(|date| {
            price *= 1.0 + rng.gen_range(-0.025..0.026);
            Observation::new(date, price)
        })
        .collect()
}

fn gateway(with_rates: bool) -> MarketDataGateway {
    let rates = if with_rates {
        FixedRateSource::new(cdi(11))
    } else {
        FixedRateSource::default()
    };
    let prices = FixedPriceSource::new()
        .with_closes("BOVA11.SA", random_walk(1, d(2018, 1, 1), d(2024, 12, 31)))
        .with_closes("^BVSP", random_walk(2, d(2018, 1, 1), d(2024, 12, 31)))
        .with_closes("KNIP11.SA", random_walk(3, d(2024, 6, 17), d(2024, 6, 28)));
    MarketDataGateway::new(
        Arc::new(rates),
        Arc::new(prices),
        Arc::new(MemoryCache::new()),
        GatewayConfig::default(),
    )
}

fn three_assets() -> Vec<Holding> {
    vec![
        Holding::new("CDB Banco", "Renda Fixa Pos").with_target_pct(50.0),
        Holding::new("Tesouro Prefixado 2029", "Renda Fixa Pre").with_target_pct(30.0),
        Holding::new("Cotas sem cadastro", "").with_target_pct(20.0),
    ]
}

#[tokio::test]
async fn test_three_asset_fallback_scenario() {
    let gateway = gateway(true);
    let (start, end) = (d(2024, 1, 1), as_of());
    let composite = Compositor::new(&gateway)
        .compose(&three_assets(), start, end)
        .await
        .unwrap();

    let components = &composite.components;
    assert_eq!(components.len(), 3);
    assert_relative_eq!(
        components.iter().map(|c| c.weight).sum::<f64>(),
        1.0,
        epsilon = 1e-9
    );

    assert_eq!(components[0].proxy, Proxy::rate(1.02));
    assert_eq!(components[0].origin, SeriesOrigin::Market);
    assert_eq!(components[1].rule, ProxyRule::Category);
    assert_eq!(components[1].origin, SeriesOrigin::RateFallback);
    assert_eq!(components[2].rule, ProxyRule::Default);

    // Every component is a CDI multiple, so the composite is one too.
    let blended = 0.5 * 1.02 + 0.3 * 1.10 + 0.2 * 1.0;
    let cdi = &composite.risk_free.series;
    for point in composite.series.points() {
        let expected = (cdi.get(point.date).unwrap() - 1.0) * blended + 1.0;
        assert_relative_eq!(point.factor, expected, epsilon = 1e-12);
    }
}

#[tokio::test]
async fn test_empty_and_zero_weight_portfolios_fail() {
    let gateway = gateway(true);
    let backtester = Backtester::new(&gateway);

    let empty = backtester.run(&[], &[], as_of()).await;
    assert!(empty.report().is_none());
    assert_eq!(
        empty.error(),
        Some(BacktestError::EmptyPortfolio.to_string().as_str())
    );

    let zero = vec![Holding::new("A", "Caixa"), Holding::new("B", "Caixa").with_target_pct(0.0)];
    let outcome = backtester.run(&zero, &[Window::OneYear], as_of()).await;
    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json.get("error").is_some());
    assert!(json.get("windows").is_none());
}

#[tokio::test]
async fn test_insufficient_alignment() {
    let gateway = gateway(true);
    let holdings = vec![
        Holding::new("CDB", "Caixa").with_target_pct(50.0),
        Holding::new("Kinea KNIP11", "").with_target_pct(50.0),
    ];
    let err = Compositor::new(&gateway)
        .compose(&holdings, d(2024, 1, 1), as_of())
        .await
        .unwrap_err();
    assert!(matches!(err, BacktestError::InsufficientData { required: 10, actual } if actual < 10));
}

#[tokio::test]
async fn test_financial_values_weight_when_no_percentages() {
    let gateway = gateway(true);
    let holdings = vec![
        Holding::new("Caixa", "Caixa").with_financial_value(300_000.0),
        Holding::new("VALE3", "").with_financial_value(100_000.0),
    ];
    let composite = Compositor::new(&gateway)
        .compose(&holdings, d(2024, 1, 1), as_of())
        .await
        .unwrap();
    assert_relative_eq!(composite.components[0].weight, 0.75, epsilon = 1e-12);
    assert_eq!(composite.components[1].proxy, Proxy::ticker("BOVA11.SA", 0.90));
    assert_eq!(composite.components[1].origin, SeriesOrigin::Market);
}

#[tokio::test]
async fn test_weights_sum_to_one_for_random_portfolios() {
    let gateway = gateway(true);
    let categories = ["Caixa", "Renda Fixa Pre", "Renda Variavel", "Multimercado", "Cambial", ""];
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let n = rng.gen_range(1..8);
        let holdings: Vec<Holding> = (0..n)
            .map(|i| {
                let category = categories[rng.gen_range(0..categories.len())];
                Holding::new(format!("Ativo {i}"), category)
                    .with_target_pct(rng.gen_range(0.5..40.0))
            })
            .collect();
        let composite = Compositor::new(&gateway)
            .compose(&holdings, d(2023, 6, 1), as_of())
            .await
            .unwrap();
        let total: f64 = composite.components.iter().map(|c| c.weight).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        assert!(composite.series.factors().all(|f| f > 0.0));
    }
}

#[tokio::test]
async fn test_backtest_report_identities() {
    let gateway = gateway(true);
    let holdings = vec![
        Holding::new("BOVA11", "Renda Variavel").with_target_pct(40.0),
        Holding::new("CDB", "Renda Fixa CDI+").with_target_pct(60.0),
    ];
    let outcome = Backtester::new(&gateway).run(&holdings, &[], as_of()).await;
    let report = outcome.report().unwrap();

    assert_eq!(report.windows.len(), Window::ALL.len());
    assert_eq!(report.ibov_origin, SeriesOrigin::Market);
    assert_eq!(report.end, as_of());

    let one_year = report.window(Window::OneYear).unwrap();
    assert_eq!(one_year.trading_days, 252);
    assert_relative_eq!(
        annualize(one_year.total_return, one_year.trading_days),
        one_year.annualized_return,
        epsilon = 1e-12
    );
    assert!(one_year.max_drawdown <= 0.0);
    assert!(one_year.volatility > 0.0);
    assert_relative_eq!(
        one_year.alpha_cdi,
        one_year.total_return - one_year.cdi_return,
        epsilon = 1e-15
    );
    assert!(one_year.ihfa_return > one_year.cdi_return);

    // 31 calendar days per month leaves more history than the window needs.
    let five_years = report.window(Window::FiveYears).unwrap();
    assert_eq!(five_years.trading_days, 1260);
    assert!(report.observations > 1260);
    assert_eq!(report.cumulative.len(), 1260);

    // Cumulative path ends at the longest window's total return.
    let last = report.cumulative.last().unwrap();
    assert_eq!(last.date, report.end);
    assert_relative_eq!(last.portfolio - 1.0, five_years.total_return, epsilon = 1e-9);
    assert_relative_eq!(last.cdi - 1.0, five_years.cdi_return, epsilon = 1e-9);
}

#[tokio::test]
async fn test_offline_run_uses_synthetic_rate() {
    let gateway = MarketDataGateway::new(
        Arc::new(FixedRateSource::default()),
        Arc::new(FixedPriceSource::new()),
        Arc::new(NoopCache),
        GatewayConfig::default(),
    );
    let holdings = vec![
        Holding::new("NTN-B", "Renda Fixa Inflacao").with_target_pct(70.0),
        Holding::new("Caixa", "Caixa").with_target_pct(30.0),
    ];
    let outcome = Backtester::new(&gateway)
        .run(&holdings, &[Window::OneYear], as_of())
        .await;
    let report = outcome.report().unwrap();

    assert_eq!(report.cdi_origin, SeriesOrigin::Synthetic);
    assert_eq!(report.ibov_origin, SeriesOrigin::Missing);
    assert_eq!(report.components[0].origin, SeriesOrigin::RateFallback);
    let metrics = report.window(Window::OneYear).unwrap();
    assert_relative_eq!(metrics.ibov_return, 0.0);
    assert!(metrics.total_return > metrics.cdi_return);
}

#[test]
fn test_metrics_are_pure() {
    let mut rng = StdRng::seed_from_u64(9);
    let series = DailyFactorSeries::from_unsorted(
        business_days(d(2022, 1, 3), d(2024, 6, 28))
            .map(|date| (date, 1.0 + rng.gen_range(-0.02..0.021))),
    );
    let dates: Vec<NaiveDate> = series.dates().collect();
    let cdi = DailyFactorSeries::constant(d(2022, 1, 3), d(2024, 6, 28), 1.0004);
    let benchmarks = Benchmarks::align(&dates, &cdi, &DailyFactorSeries::empty());

    let first = compute(&series, &benchmarks, &Window::ALL);
    let second = compute(&series, &benchmarks, &Window::ALL);
    assert_eq!(first, second);

    let six = &first[&Window::SixMonths];
    let tail: f64 = series.factors().skip(series.len() - 126).product();
    assert_relative_eq!(six.total_return, tail - 1.0, epsilon = 1e-12);
}

#[tokio::test]
async fn test_compare_current_and_proposed() {
    let gateway = gateway(true);
    let current = vec![Holding::new("X", "").with_financial_value(100_000.0)];
    let proposed = vec![
        Holding::new("X", "").with_target_pct(60.0),
        Holding::new("BOVA11", "Renda Variavel").with_target_pct(40.0),
    ];
    let windows = [Window::SixMonths, Window::OneYear];
    let comparison = Backtester::new(&gateway)
        .compare(&current, &proposed, &windows, as_of())
        .await;

    assert_eq!(comparison.diff.len(), 2);
    let diff = comparison.diff[&Window::OneYear];
    let cur = comparison.current.report().unwrap().window(Window::OneYear).unwrap();
    let prop = comparison.proposed.report().unwrap().window(Window::OneYear).unwrap();
    assert_relative_eq!(diff.return_diff, prop.total_return - cur.total_return);
    assert_relative_eq!(diff.vol_diff, prop.volatility - cur.volatility);

    let json = serde_json::to_value(&comparison).unwrap();
    assert!(json["diff"]["1 Ano"]["sharpe_diff"].is_number());
}

#[tokio::test]
async fn test_failed_side_only_removes_diff() {
    let gateway = gateway(true);
    let current = vec![Holding::new("CDB", "Caixa").with_target_pct(100.0)];
    let comparison = Backtester::new(&gateway)
        .compare(&current, &[], &[Window::OneYear], as_of())
        .await;

    assert!(comparison.current.report().is_some());
    assert!(matches!(comparison.proposed, BacktestOutcome::Failed { .. }));
    assert!(comparison.diff.is_empty());
}
