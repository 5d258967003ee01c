#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lastro-invest/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backtest;
pub mod comparison;
pub mod composite;
pub mod error;
pub mod metrics;
pub mod window;

pub use backtest::{BacktestOutcome, BacktestReport, Backtester, CumulativePoint};
pub use comparison::{Comparison, WindowDiff};
pub use composite::{Component, CompositeSeries, Compositor};
pub use error::{BacktestError, Result};
pub use metrics::{Benchmarks, WindowMetrics};
pub use window::Window;

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
