#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/lastro-invest/lastro/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod series;
pub mod sources;
pub mod synthetic;

pub use cache::{CacheKey, MemoryCache, NoopCache, SeriesCache, SqliteCache};
pub use config::GatewayConfig;
pub use error::{DataError, Result};
pub use gateway::{MarketDataGateway, SeriesId, SeriesOrigin, SourcedSeries};
pub use series::{DailyFactorSeries, FactorPoint, business_days, is_business_day};
pub use sources::{FixedPriceSource, FixedRateSource, Observation, PriceSource, RateSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
