//! Central bank (BCB) SGS time series client.
//!
//! Series 12 is the CDI rate. The API answers with
//! `[{"data": "02/01/2024", "valor": "0.043739"}, ...]`, values in percent.

use super::{Observation, RateSource};
use crate::config::GatewayConfig;
use crate::error::{DataError, Result};
use crate::series::DailyFactorSeries;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Trading days per year used to de-annualize rates.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Decimal rates above this median are annualized, below it daily.
const ANNUALIZED_THRESHOLD: f64 = 0.01;

/// Date layout of the SGS API, both in queries and responses.
const SGS_DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Deserialize)]
struct SgsRow {
    data: String,
    valor: Value,
}

/// Rate source backed by the BCB SGS API.
#[derive(Debug, Clone)]
pub struct BcbRateSource {
    client: reqwest::Client,
    base_url: String,
    series_code: u32,
}

impl BcbRateSource {
    /// Create a client from gateway settings.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.sgs_base_url.trim_end_matches('/').to_string(),
            series_code: config.sgs_series_code,
        })
    }

    /// Request URL for a date range.
    pub fn url(&self, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/bcdata.sgs.{}/dados?formato=json&dataInicial={}&dataFinal={}",
            self.base_url,
            self.series_code,
            start.format(SGS_DATE_FORMAT),
            end.format(SGS_DATE_FORMAT),
        )
    }
}

#[async_trait]
impl RateSource for BcbRateSource {
    async fn fetch_rates(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let response = self.client.get(self.url(start, end)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http(format!(
                "SGS series {} returned {status}",
                self.series_code
            )));
        }

        let body = response.text().await?;
        let observations = parse_sgs(&body)?;
        if observations.is_empty() {
            return Err(DataError::MissingData {
                symbol: format!("sgs.{}", self.series_code),
                reason: "No observations in range".to_string(),
            });
        }
        Ok(observations)
    }
}

/// Parse an SGS JSON response, skipping rows with a bad date or value.
///
/// A body that is not a list of rows (the API reports unknown series and
/// bad ranges as an object) is a [`DataError::Parse`].
pub fn parse_sgs(body: &str) -> Result<Vec<Observation>> {
    let rows: Vec<SgsRow> = serde_json::from_str(body)
        .map_err(|e| DataError::Parse(format!("unexpected SGS response: {e}")))?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let date = NaiveDate::parse_from_str(row.data.trim(), SGS_DATE_FORMAT).ok()?;
            let value = match row.valor {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
                _ => None,
            }?;
            value.is_finite().then_some(Observation::new(date, value))
        })
        .collect())
}

/// Convert percentage rates into daily factors.
///
/// Values are divided by 100; when the median exceeds 1% the rates are
/// annualized and become `(1 + r)^(1/252)`, otherwise `1 + r`.
pub fn rates_to_factors(observations: &[Observation]) -> DailyFactorSeries {
    let rates: Vec<f64> = observations.iter().map(|o| o.value / 100.0).collect();
    let Some(median) = median(&rates) else {
        return DailyFactorSeries::empty();
    };
    let annualized = median > ANNUALIZED_THRESHOLD;
    tracing::debug!(median, annualized, "converting rate observations");

    DailyFactorSeries::from_unsorted(observations.iter().zip(&rates).map(|(obs, rate)| {
        let factor = if annualized {
            (1.0 + rate).powf(1.0 / TRADING_DAYS_PER_YEAR)
        } else {
            1.0 + rate
        };
        (obs.date, factor)
    }))
}

fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_url() {
        let source = BcbRateSource::new(&GatewayConfig::default()).unwrap();
        assert_eq!(
            source.url(d(2024, 1, 2), d(2024, 12, 31)),
            "https://api.bcb.gov.br/dados/serie/bcdata.sgs.12/dados?formato=json&dataInicial=02/01/2024&dataFinal=31/12/2024"
        );
    }

    #[test]
    fn test_parse_sgs_skips_bad_rows() {
        let body = r#"[
            {"data": "02/01/2024", "valor": "0.043739"},
            {"data": "03/01/2024", "valor": "0,043739"},
            {"data": "2024-01-04", "valor": "0.043739"},
            {"data": "05/01/2024", "valor": ""},
            {"data": "08/01/2024", "valor": 0.05}
        ]"#;
        let observations = parse_sgs(body).unwrap();
        assert_eq!(observations.len(), 3);
        assert_eq!(observations[1].date, d(2024, 1, 3));
        assert_relative_eq!(observations[1].value, 0.043739);
        assert_relative_eq!(observations[2].value, 0.05);
    }

    #[test]
    fn test_parse_sgs_rejects_non_list() {
        assert!(matches!(
            parse_sgs(r#"{"erro": "serie inexistente"}"#),
            Err(DataError::Parse(_))
        ));
        assert!(matches!(parse_sgs("<html>"), Err(DataError::Parse(_))));
    }

    #[test]
    fn test_daily_rates() {
        let observations = vec![
            Observation::new(d(2024, 1, 2), 0.043739),
            Observation::new(d(2024, 1, 3), 0.043739),
        ];
        let series = rates_to_factors(&observations);
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series.get(d(2024, 1, 2)).unwrap(), 1.00043739, epsilon = 1e-12);
    }

    #[test]
    fn test_annualized_rates() {
        let observations = vec![
            Observation::new(d(2024, 1, 2), 11.65),
            Observation::new(d(2024, 1, 3), 11.65),
            Observation::new(d(2024, 1, 4), 11.65),
        ];
        let series = rates_to_factors(&observations);
        let expected = 1.1165_f64.powf(1.0 / 252.0);
        assert_relative_eq!(series.get(d(2024, 1, 3)).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_rates() {
        assert!(rates_to_factors(&[]).is_empty());
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
