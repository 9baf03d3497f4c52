use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::NetworkConfig,
    model::{
        AqiReading, HistoricalSeries, HistoricalStats, PredictionPoint, PredictionSeries,
        RangePreset, Timestamp,
    },
};

/// Failure of a single fetch cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API returned error status: {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

// ==================== Wire Payloads ====================

#[derive(Debug, Deserialize)]
struct HistoricalPayload {
    stats: HistoricalStats,
    timestamps: Vec<String>,
    aqi_values: Vec<f64>,
    pm25_values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct PredictionPayload {
    timestamps: Vec<String>,
    actual: Vec<Option<f64>>,
    predicted: Vec<f64>,
    confidence: Vec<[f64; 2]>,
}

fn parse_timestamp(raw: &str, index: usize) -> Result<Timestamp, ApiError> {
    Timestamp::parse(raw)
        .ok_or_else(|| ApiError::Malformed(format!("unparseable timestamp {raw:?} at index {index}")))
}

fn ensure_aligned(expected: usize, field: &str, actual: usize) -> Result<(), ApiError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ApiError::Malformed(format!(
            "{field} has {actual} entries but timestamps has {expected}"
        )))
    }
}

impl TryFrom<HistoricalPayload> for HistoricalSeries {
    type Error = ApiError;

    fn try_from(payload: HistoricalPayload) -> Result<Self, ApiError> {
        let n = payload.timestamps.len();
        ensure_aligned(n, "aqi_values", payload.aqi_values.len())?;
        ensure_aligned(n, "pm25_values", payload.pm25_values.len())?;

        let readings = payload
            .timestamps
            .iter()
            .zip(payload.aqi_values)
            .zip(payload.pm25_values)
            .enumerate()
            .map(|(i, ((raw, aqi), pm25))| {
                Ok(AqiReading {
                    timestamp: parse_timestamp(raw, i)?,
                    aqi,
                    pm25,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(Self {
            stats: payload.stats,
            readings,
        })
    }
}

impl TryFrom<PredictionPayload> for PredictionSeries {
    type Error = ApiError;

    fn try_from(payload: PredictionPayload) -> Result<Self, ApiError> {
        let n = payload.timestamps.len();
        ensure_aligned(n, "actual", payload.actual.len())?;
        ensure_aligned(n, "predicted", payload.predicted.len())?;
        ensure_aligned(n, "confidence", payload.confidence.len())?;

        let points = payload
            .timestamps
            .iter()
            .zip(payload.actual)
            .zip(payload.predicted)
            .zip(payload.confidence)
            .enumerate()
            .map(|(i, (((raw, actual), predicted), confidence))| {
                Ok(PredictionPoint {
                    timestamp: parse_timestamp(raw, i)?,
                    actual,
                    predicted,
                    confidence: confidence.into(),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(Self { points })
    }
}

impl HistoricalSeries {
    /// Decode and validate a `/api/historical_data` body.
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let payload: HistoricalPayload =
            serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        payload.try_into()
    }
}

impl PredictionSeries {
    /// Decode and validate a `/api/predictions` body.
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let payload: PredictionPayload =
            serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))?;
        payload.try_into()
    }
}

// ==================== Client ====================

/// API client for the dashboard backend.
#[derive(Clone, Debug)]
pub struct DashboardApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl DashboardApiClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(base_url: &str, network_config: &NetworkConfig) -> Result<Self> {
        let mut base_url =
            Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::Network(format!("invalid endpoint {path}: {e}")))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }

    async fn get_body(&self, url: Url) -> Result<String, ApiError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Fetch the historical series for an inclusive date range.
    pub async fn fetch_historical(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalSeries, ApiError> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let url = self.endpoint(
            "api/historical_data",
            &[("start_date", start.as_str()), ("end_date", end.as_str())],
        )?;

        let body = self.get_body(url).await?;
        HistoricalSeries::from_json(&body)
    }

    /// Fetch actual, predicted and confidence values for a range preset.
    pub async fn fetch_predictions(
        &self,
        range: &RangePreset,
    ) -> Result<PredictionSeries, ApiError> {
        let url = self.endpoint("api/predictions", &[("range", range.as_str())])?;

        let body = self.get_body(url).await?;
        PredictionSeries::from_json(&body)
    }
}
