//! Error types for backtesting.

use thiserror::Error;

/// Result type for backtest operations.
pub type Result<T> = std::result::Result<T, BacktestError>;

/// Reasons a composite series cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BacktestError {
    /// No holding carries a positive weight
    #[error("Empty portfolio: no holding has a positive weight")]
    EmptyPortfolio,

    /// Every weighted holding came back without data
    #[error("No return data available for any holding")]
    NoReturnData,

    /// Too few dates common to all holdings
    #[error("Insufficient data for backtest: need at least {required} aligned days, got {actual}")]
    InsufficientData {
        /// Minimum aligned days
        required: usize,
        /// Aligned days found
        actual: usize,
    },
}
