//! Report bundles.
//!
//! [`analyze`] runs every structural analysis over a current/proposed pair.
//! A [`Report`] wraps that analysis together with an optional backtest
//! comparison and its efficiency tables, ready to hand to a presentation
//! layer.

use crate::allocation::{AllocationComparison, allocation_comparison};
use crate::classification::{ClassificationEntry, classify};
use crate::concentration::{ConcentrationReport, concentration};
use crate::efficiency::{EfficiencyRow, efficiency};
use crate::export::{ExportError, ExportFormat, Exporter, json};
use crate::liquidity::{LiquidityComparison, LiquidityTable, liquidity_comparison};
use crate::maturity::{MaturityBucket, maturity_ladder};
use crate::tax::{TaxAnalysis, tax_analysis};
use chrono::{DateTime, NaiveDate, Utc};
use lastro_backtest::Comparison;
use lastro_holdings::Holding;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Neither portfolio has any holding.
    #[error("Report needs at least one holding in the current or proposed portfolio")]
    EmptyPortfolios,
}

/// Every structural analysis of a current/proposed pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralAnalysis {
    /// Allocation by class and exposure
    pub allocation: AllocationComparison,
    /// Concentration of the current portfolio
    pub concentration: ConcentrationReport,
    /// Bottom-up classification of current holdings
    pub classification: Vec<ClassificationEntry>,
    /// Liquidity profiles
    pub liquidity: LiquidityComparison,
    /// Tax exemption and turnover
    pub tax: TaxAnalysis,
    /// Maturity ladder of the current portfolio
    pub maturity: Vec<MaturityBucket>,
}

/// Run every structural analysis.
pub fn analyze(
    current: &[Holding],
    proposed: &[Holding],
    model: Option<&[Holding]>,
    table: &LiquidityTable,
    as_of: NaiveDate,
) -> StructuralAnalysis {
    StructuralAnalysis {
        allocation: allocation_comparison(current, proposed, model),
        concentration: concentration(current),
        classification: classify(current, proposed, as_of),
        liquidity: liquidity_comparison(current, proposed, table),
        tax: tax_analysis(current, proposed),
        maturity: maturity_ladder(current),
    }
}

impl Exporter for StructuralAnalysis {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        json(self, format)
    }
}

/// Efficiency tables of both sides of a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTables {
    /// Current portfolio
    pub current: Vec<EfficiencyRow>,
    /// Proposed portfolio
    pub proposed: Vec<EfficiencyRow>,
}

impl EfficiencyTables {
    /// Tables for a comparison; failed sides are empty.
    pub fn of(comparison: &Comparison) -> Self {
        Self {
            current: efficiency(&comparison.current),
            proposed: efficiency(&comparison.proposed),
        }
    }
}

/// A proposal report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Client or proposal name.
    pub client: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Reference date of the analysis.
    pub as_of: NaiveDate,

    /// Structural analytics.
    pub analysis: StructuralAnalysis,

    /// Backtest comparison, when market data was requested.
    pub comparison: Option<Comparison>,

    /// Efficiency tables derived from the comparison.
    pub efficiency: EfficiencyTables,
}

impl Report {
    /// Create a new report.
    pub fn new(
        client: String,
        as_of: NaiveDate,
        analysis: StructuralAnalysis,
        comparison: Option<Comparison>,
    ) -> Self {
        let efficiency = comparison
            .as_ref()
            .map(EfficiencyTables::of)
            .unwrap_or_default();
        Self {
            client,
            timestamp: Utc::now(),
            as_of,
            analysis,
            comparison,
            efficiency,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Exporter for Report {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        json(self, format)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    client: Option<String>,
    as_of: Option<NaiveDate>,
    current: Vec<Holding>,
    proposed: Vec<Holding>,
    model: Option<Vec<Holding>>,
    liquidity: Option<LiquidityTable>,
    comparison: Option<Comparison>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client name.
    pub fn client(mut self, client: impl Into<String>) -> Self {
        self.client = Some(client.into());
        self
    }

    /// Set the reference date (defaults to today).
    pub const fn as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Set the current portfolio.
    pub fn current(mut self, holdings: Vec<Holding>) -> Self {
        self.current = holdings;
        self
    }

    /// Set the proposed portfolio.
    pub fn proposed(mut self, holdings: Vec<Holding>) -> Self {
        self.proposed = holdings;
        self
    }

    /// Set the model portfolio.
    pub fn model(mut self, holdings: Vec<Holding>) -> Self {
        self.model = Some(holdings);
        self
    }

    /// Set the fund liquidity table.
    pub fn liquidity_table(mut self, table: LiquidityTable) -> Self {
        self.liquidity = Some(table);
        self
    }

    /// Attach a backtest comparison.
    pub fn comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        if self.current.is_empty() && self.proposed.is_empty() {
            return Err(ReportError::EmptyPortfolios);
        }
        let as_of = self.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let table = self.liquidity.unwrap_or_default();
        let analysis = analyze(
            &self.current,
            &self.proposed,
            self.model.as_deref(),
            &table,
            as_of,
        );
        Ok(Report::new(
            self.client.unwrap_or_default(),
            as_of,
            analysis,
            self.comparison,
        ))
    }
}
