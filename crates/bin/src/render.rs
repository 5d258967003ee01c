//! Plain-text tables for the terminal.

use lastro_backtest::{BacktestOutcome, BacktestReport, Comparison};
use lastro_holdings::{Holding, ResolvedProxy};
use std::fmt::{self, Write};

const RULE: &str = "────────────────────────────────────────────────────────────────────────────";

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Proxy chosen for each holding.
pub(crate) fn proxies(resolved: &[(&Holding, ResolvedProxy)]) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{:<36} {:<40} Rule", "Holding", "Proxy")?;
    writeln!(out, "{RULE}")?;
    for (holding, resolved) in resolved {
        writeln!(
            out,
            "{:<36} {:<40} {:?}",
            truncate(&holding.name, 35),
            resolved.proxy.to_string(),
            resolved.rule
        )?;
    }
    Ok(out)
}

/// Window metrics and components of one backtest.
pub(crate) fn backtest(title: &str, outcome: &BacktestOutcome) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "{title}")?;
    writeln!(out, "{RULE}")?;
    match outcome {
        BacktestOutcome::Failed { error } => writeln!(out, "Backtest failed: {error}")?,
        BacktestOutcome::Completed(report) => write_report(&mut out, report)?,
    }
    Ok(out)
}

fn write_report(out: &mut String, report: &BacktestReport) -> fmt::Result {
    writeln!(
        out,
        "Period: {} .. {} ({} days)  CDI: {:?}  IBOV: {:?}",
        report.start, report.end, report.observations, report.cdi_origin, report.ibov_origin
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "{:<10} {:>9} {:>9} {:>9} {:>7} {:>8} {:>9} {:>9} {:>9}",
        "Window", "Return", "Ann.", "Vol", "Sharpe", "Sortino", "Max DD", "CDI", "Alpha"
    )?;
    for (window, m) in &report.windows {
        writeln!(
            out,
            "{:<10} {:>9} {:>9} {:>9} {:>7.2} {:>8.2} {:>9} {:>9} {:>9}",
            window.label(),
            pct(m.total_return),
            pct(m.annualized_return),
            pct(m.volatility),
            m.sharpe,
            m.sortino,
            pct(m.max_drawdown),
            pct(m.cdi_return),
            pct(m.alpha_cdi)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{:<36} {:>8} {:<22} Origin", "Component", "Weight", "Proxy")?;
    for c in &report.components {
        writeln!(
            out,
            "{:<36} {:>8} {:<22} {:?}",
            truncate(&c.name, 35),
            pct(c.weight),
            truncate(&c.proxy.to_string(), 22),
            c.origin
        )?;
    }
    Ok(())
}

/// Both backtests followed by the per-window differences.
pub(crate) fn comparison(comparison: &Comparison) -> Result<String, fmt::Error> {
    let mut out = backtest("CURRENT PORTFOLIO", &comparison.current)?;
    writeln!(out)?;
    out.push_str(&backtest("PROPOSED PORTFOLIO", &comparison.proposed)?);
    writeln!(out)?;
    writeln!(out, "PROPOSED - CURRENT")?;
    writeln!(out, "{RULE}")?;
    if comparison.diff.is_empty() {
        writeln!(out, "No window available on both sides")?;
        return Ok(out);
    }
    writeln!(
        out,
        "{:<10} {:>9} {:>9} {:>7} {:>9}",
        "Window", "Return", "Vol", "Sharpe", "Max DD"
    )?;
    for (window, d) in &comparison.diff {
        writeln!(
            out,
            "{:<10} {:>9} {:>9} {:>7.2} {:>9}",
            window.label(),
            pct(d.return_diff),
            pct(d.vol_diff),
            d.sharpe_diff,
            pct(d.dd_diff)
        )?;
    }
    Ok(out)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use lastro_holdings::resolve;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("PETR4", 10), "PETR4");
        assert_eq!(truncate("Fundo de Investimento Longo", 6), "Fundo…");
    }

    #[test]
    fn test_failed_backtest() {
        let outcome = BacktestOutcome::Failed {
            error: "Portfolio has no weighted holdings".into(),
        };
        let text = backtest("CURRENT", &outcome).unwrap();
        assert!(text.starts_with("CURRENT\n"));
        assert!(text.contains("Backtest failed: Portfolio has no weighted holdings"));
    }

    #[test]
    fn test_comparison_without_common_windows() {
        let failed = || BacktestOutcome::Failed {
            error: "no data".into(),
        };
        let text = comparison(&Comparison {
            current: failed(),
            proposed: failed(),
            diff: Default::default(),
        })
        .unwrap();
        assert!(text.contains("PROPOSED PORTFOLIO"));
        assert!(text.contains("No window available on both sides"));
    }

    #[test]
    fn test_proxy_table() {
        let holding = Holding::new("VALE3", "");
        let text = proxies(&[(&holding, resolve(&holding))]).unwrap();
        assert!(text.contains("VALE3"));
        assert!(text.contains("BOVA11.SA"));
    }
}
