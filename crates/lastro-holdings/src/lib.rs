#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lastro-invest/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod holding;
pub mod proxy;
pub mod taxonomy;

pub use holding::{Holding, PortfolioSide, WeightBasis, parse_date, parse_number};
pub use proxy::{Proxy, ProxyRule, ResolvedProxy, resolve};
pub use taxonomy::{AssetClass, ExposureBucket};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
