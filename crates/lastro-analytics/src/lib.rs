#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lastro-invest/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod allocation;
pub mod classification;
pub mod concentration;
pub mod efficiency;
pub mod export;
pub mod liquidity;
pub mod maturity;
pub mod report;
pub mod tax;

mod shares;

pub use allocation::{AllocationComparison, ClassAllocation, ExposureSplit, allocation_comparison};
pub use classification::{Classification, ClassificationEntry, classify};
pub use concentration::{ConcentrationReport, IssuerShare, StrategyShare, concentration};
pub use efficiency::{EfficiencyRow, efficiency};
pub use export::{ExportError, ExportFormat, Exporter};
pub use liquidity::{
    FundLiquidity, LiquidityComparison, LiquidityProfile, LiquidityTable, LiquidityTier,
    TableError, liquidity_comparison,
};
pub use maturity::{MaturityBucket, maturity_ladder};
pub use report::{EfficiencyTables, Report, ReportBuilder, ReportError, StructuralAnalysis, analyze};
pub use tax::{TaxAnalysis, Turnover, tax_analysis};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
