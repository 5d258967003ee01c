//! Export of analytics results.
//!
//! Every result can be written as compact or pretty JSON. Tabular results
//! also export as CSV, one row per record; nested results are flattened and
//! their scalar summaries written as `#` comment lines above the table.

use crate::allocation::AllocationComparison;
use crate::classification::ClassificationEntry;
use crate::concentration::ConcentrationReport;
use crate::efficiency::EfficiencyRow;
use crate::liquidity::{LiquidityComparison, LiquidityTier};
use crate::maturity::MaturityBucket;
use crate::tax::TaxAnalysis;
use lastro_backtest::{BacktestOutcome, Comparison, Window};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "pretty" | "pretty-json" | "pretty_json" => Ok(Self::PrettyJson),
            other => Err(ExportError::InvalidFormat(other.to_string())),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the format is unsupported.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

/// Serialize `value` as JSON; CSV is not handled here.
pub(crate) fn json<T: Serialize + ?Sized>(
    value: &T,
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string(value)?),
        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(value)?),
        ExportFormat::Csv => Err(ExportError::InvalidFormat(
            "CSV is not available for this result".to_string(),
        )),
    }
}

/// Write records as CSV with a header row.
fn csv_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for Vec<ClassificationEntry> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_rows(self),
            _ => json(self, format),
        }
    }
}

impl Exporter for Vec<MaturityBucket> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_rows(self),
            _ => json(self, format),
        }
    }
}

impl Exporter for Vec<EfficiencyRow> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_rows(self),
            _ => json(self, format),
        }
    }
}

/// Flattened class or exposure row for CSV export.
#[derive(Debug, Serialize)]
struct AllocationFlat {
    class: &'static str,
    current_pct: f64,
    proposed_pct: f64,
    model_pct: Option<f64>,
    delta: f64,
}

impl Exporter for AllocationComparison {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let classes = self.class_breakdown.iter().map(|row| AllocationFlat {
                    class: row.class.name(),
                    current_pct: row.current_pct,
                    proposed_pct: row.proposed_pct,
                    model_pct: Some(row.model_pct),
                    delta: row.delta,
                });
                let exposures = self.exposure_summary.iter().map(|(bucket, split)| AllocationFlat {
                    class: bucket.key(),
                    current_pct: split.current,
                    proposed_pct: split.proposed,
                    model_pct: None,
                    delta: split.proposed - split.current,
                });
                csv_rows(classes.chain(exposures))
            }
            _ => json(self, format),
        }
    }
}

/// Flattened concentration row for CSV export.
#[derive(Debug, Serialize)]
struct ConcentrationFlat<'a> {
    kind: &'static str,
    name: &'a str,
    financial_value: f64,
    pct: f64,
    holdings: usize,
}

impl Exporter for ConcentrationReport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();
                output.push_str(&format!("# Total: {}\n", self.total));
                output.push_str(&format!("# HHI: {}\n", self.hhi_issuer));
                output.push_str(&format!("# Top 5 issuers: {}\n", self.top5_issuer_pct));

                let issuers = self.by_issuer.iter().map(|s| ConcentrationFlat {
                    kind: "issuer",
                    name: &s.issuer,
                    financial_value: s.financial_value,
                    pct: s.pct,
                    holdings: s.holdings,
                });
                let strategies = self.by_strategy.iter().map(|s| ConcentrationFlat {
                    kind: "strategy",
                    name: s.strategy.name(),
                    financial_value: s.financial_value,
                    pct: s.pct,
                    holdings: s.holdings,
                });
                output.push_str(&csv_rows(issuers.chain(strategies))?);
                Ok(output)
            }
            _ => json(self, format),
        }
    }
}

/// Flattened liquidity tier for CSV export.
#[derive(Debug, Serialize)]
struct LiquidityFlat {
    tier: LiquidityTier,
    current_pct: f64,
    proposed_pct: f64,
}

impl Exporter for LiquidityComparison {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();
                output.push_str(&format!("# Quick cash (current): {}\n", self.current.quick_cash));
                output.push_str(&format!(
                    "# Quick cash (proposed): {}\n",
                    self.proposed.quick_cash
                ));
                output.push_str(&csv_rows(LiquidityTier::ALL.into_iter().map(|tier| {
                    LiquidityFlat {
                        tier,
                        current_pct: self.current.pct(tier),
                        proposed_pct: self.proposed.pct(tier),
                    }
                }))?);
                Ok(output)
            }
            _ => json(self, format),
        }
    }
}

/// One portfolio side of the tax analysis for CSV export.
#[derive(Debug, Serialize)]
struct TaxFlat {
    side: &'static str,
    exempt_pct: f64,
    names: usize,
}

impl Exporter for TaxAnalysis {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let turnover = &self.turnover;
                let mut output = String::new();
                output.push_str(&format!("# Exempt delta: {}\n", self.delta_exempt));
                output.push_str(&format!(
                    "# Leaving: {}, entering: {}, kept: {}, changed: {}\n",
                    turnover.leaving, turnover.entering, turnover.kept, self.changed
                ));
                output.push_str(&csv_rows([
                    TaxFlat {
                        side: "current",
                        exempt_pct: self.current_exempt_pct,
                        names: turnover.total_current,
                    },
                    TaxFlat {
                        side: "proposed",
                        exempt_pct: self.proposed_exempt_pct,
                        names: turnover.total_proposed,
                    },
                ])?);
                Ok(output)
            }
            _ => json(self, format),
        }
    }
}

/// Flattened window metrics of one comparison side for CSV export.
#[derive(Debug, Serialize)]
struct ComparisonFlat {
    window: Window,
    side: &'static str,
    total_return: f64,
    annualized_return: f64,
    volatility: f64,
    sharpe: f64,
    sortino: f64,
    max_drawdown: f64,
    alpha_cdi: f64,
}

fn comparison_rows(side: &'static str, outcome: &BacktestOutcome) -> Vec<ComparisonFlat> {
    outcome
        .windows()
        .map(|windows| {
            windows
                .iter()
                .map(|(window, m)| ComparisonFlat {
                    window: *window,
                    side,
                    total_return: m.total_return,
                    annualized_return: m.annualized_return,
                    volatility: m.volatility,
                    sharpe: m.sharpe,
                    sortino: m.sortino,
                    max_drawdown: m.max_drawdown,
                    alpha_cdi: m.alpha_cdi,
                })
                .collect()
        })
        .unwrap_or_default()
}

impl Exporter for Comparison {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut output = String::new();
                for (side, outcome) in [("current", &self.current), ("proposed", &self.proposed)] {
                    if let Some(error) = outcome.error() {
                        output.push_str(&format!("# {side}: {error}\n"));
                    }
                }
                let mut rows = comparison_rows("current", &self.current);
                rows.extend(comparison_rows("proposed", &self.proposed));
                output.push_str(&csv_rows(rows)?);
                Ok(output)
            }
            _ => json(self, format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::allocation_comparison;
    use crate::classification::classify;
    use crate::concentration::concentration;
    use crate::maturity::maturity_ladder;
    use crate::tax::tax_analysis;
    use chrono::NaiveDate;
    use lastro_holdings::Holding;

    fn current() -> Vec<Holding> {
        vec![
            Holding::new("CDB Itau 2027", "Renda Fixa Pos")
                .with_issuer("Itau")
                .with_maturity("10/05/2027")
                .with_financial_value(60_000.0),
            Holding::new("Fundo XP Macro", "Multimercado")
                .with_liquidity("D+30")
                .with_financial_value(40_000.0),
        ]
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("pretty".parse::<ExportFormat>().unwrap(), ExportFormat::PrettyJson);
        assert!(matches!(
            "xlsx".parse::<ExportFormat>(),
            Err(ExportError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_classification_csv() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entries = classify(&current(), &[], as_of);
        let csv = entries.export_to_string(ExportFormat::Csv).unwrap();

        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("name,classification,rationale,current_pct,proposed_pct,liquidity,financial_value")
        );
        assert!(csv.contains("Ilíquido em Carregamento"));
        assert!(csv.contains("CDB Itau 2027"));
    }

    #[test]
    fn test_allocation_csv_includes_buckets() {
        let result = allocation_comparison(&current(), &[], None);
        let csv = result.export_to_string(ExportFormat::Csv).unwrap();
        assert!(csv.starts_with("class,current_pct,proposed_pct,model_pct,delta"));
        assert!(csv.contains("Renda Fixa Pos,60"));
        assert!(csv.contains("credito,60"));
        assert!(csv.contains("multimercado,40"));
    }

    #[test]
    fn test_concentration_csv_header_comments() {
        let csv = concentration(&current())
            .export_to_string(ExportFormat::Csv)
            .unwrap();
        assert!(csv.starts_with("# Total: 100000\n# HHI: 5200\n"));
        assert!(csv.contains("issuer,Itau,60000"));
        assert!(csv.contains("strategy,Multimercados,40000"));
    }

    #[test]
    fn test_tax_csv() {
        let proposed = vec![
            Holding::new("LCA Itau", "").with_target_pct(25.0),
            Holding::new("Fundo XP Macro", "").with_target_pct(75.0),
        ];
        let csv = tax_analysis(&current(), &proposed)
            .export_to_string(ExportFormat::Csv)
            .unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "# Exempt delta: 25");
        assert_eq!(lines[1], "# Leaving: 1, entering: 1, kept: 1, changed: 2");
        assert_eq!(lines[2], "side,exempt_pct,names");
        assert!(lines[3].starts_with("current,") && lines[3].ends_with(",2"));
        assert_eq!(lines[4], "proposed,25.0,2");
    }

    #[test]
    fn test_maturity_json() {
        let ladder = maturity_ladder(&current());
        let json = ladder.export_to_string(ExportFormat::Json).unwrap();
        assert!(json.contains("\"2027-Q2\""));
        assert!(json.contains("\"Sem Vencimento (Fundos)\""));

        let pretty = ladder.export_to_string(ExportFormat::PrettyJson).unwrap();
        assert!(pretty.contains("  "));
    }

    #[test]
    fn test_export_to_file() {
        let ladder = maturity_ladder(&current());
        let path = std::env::temp_dir().join("lastro_test_maturity.csv");

        ladder.export_to_file(&path, ExportFormat::Csv).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Abr-Jun 2027"));

        std::fs::remove_file(path).ok();
    }
}
