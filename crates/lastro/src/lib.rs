#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lastro-invest/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod proposal;

// Re-export main types from sub-crates
pub use lastro_analytics as analytics;
pub use lastro_backtest as backtest;
pub use lastro_data as data;
pub use lastro_holdings as holdings;

pub use proposal::{Proposal, ProposalError, holdings_from_path};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
