//! Gateway settings.

use crate::cache::DEFAULT_TTL_SECS;
use serde::{Deserialize, Serialize};

/// Settings for the market data gateway.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Seconds a cached series stays valid
    pub cache_ttl_secs: u64,
    /// Per-request network timeout in seconds
    pub request_timeout_secs: u64,
    /// Base URL of the SGS API
    pub sgs_base_url: String,
    /// SGS series code of the risk-free rate
    pub sgs_series_code: u32,
    /// Annual rate implied by the synthetic fallback series
    pub synthetic_annual_rate: f64,
    /// Calendar days fetched before the start date so the first return has a prior close
    pub ticker_padding_days: i64,
    /// Symbol of the broad equity index benchmark
    pub equity_benchmark: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_TTL_SECS,
            request_timeout_secs: 30,
            sgs_base_url: "https://api.bcb.gov.br/dados/serie".to_string(),
            sgs_series_code: 12,
            synthetic_annual_rate: 0.1325,
            ticker_padding_days: 5,
            equity_benchmark: "^BVSP".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"cache_ttl_secs": 60, "equity_benchmark": "BOVA11.SA"}"#)
                .unwrap();
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.equity_benchmark, "BOVA11.SA");
        assert_eq!(config.sgs_series_code, 12);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
